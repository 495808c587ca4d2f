//! Adapters to the outside world: the OpenAI inference agent and the Reddit
//! activity source.

pub mod openai_api_agent;
pub mod reddit_source;

pub use openai_api_agent::OpenAIApiAgent;
pub use reddit_source::RedditJsonSource;
