pub mod assistant;
pub mod news;

pub use assistant::{Assistant, AssistantError, HttpAssistant};
pub use news::{Article, NewsClient, NewsError, NewsFeed};
