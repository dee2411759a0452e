//! HTTP chat service streaming agent runs over SSE.
//!
//! Each agent profile answers on `POST /api/{agent_id}`. The request carries
//! the conversation so far; the response streams UI Message Stream events as
//! SSE `data:` frames, ending with a `[DONE]` trailer.

pub mod encoder;
pub mod http;
pub mod service;
