/// Implements `with_base_url` for clients that wrap an `OpenAiHttpClient` in `http`.
macro_rules! impl_with_openai_base_url {
    ($client:ty) => {
        impl $client {
            /// Point the client at another OpenAI-compatible host.
            pub fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}

pub(crate) use impl_with_openai_base_url;

pub mod chat;
pub mod client;
pub mod image;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use chat::OpenAiChatClient;
pub use image::OpenAiImageClient;
