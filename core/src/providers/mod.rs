pub mod factory;
pub mod huggingface;
pub mod ollama;
pub mod openai;

pub use factory::create_provider;
pub use huggingface::HuggingFaceProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
