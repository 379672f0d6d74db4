pub mod journey;
pub mod llm_client;
pub mod prompt_builder;
pub mod resolver;
pub mod response_parser;
pub mod runner;
pub mod store;
