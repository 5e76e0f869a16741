//! Chat-model backed category, prompt and rename services.

use super::{CategoryService, ChatClient, ChatMessage, PromptService, RenameService};
use crate::error::ServiceError;
use crate::types::{Category, Topic};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

pub const CREATE_CATEGORIES_SYSTEM_PROMPT: &str = r#"
You are a creative designer tasked with generating 15 unique and engaging category ideas for a coloring book based on the given topic.

### Guidelines for Generating Categories:

1. **Broad and Imaginative:** Create categories that offer diverse illustration possibilities.
2. **Varied Scenes:** Ensure each category provides multiple potential scene or pose variations.
3. **Aspect Capturing:** Focus on capturing different aspects, emotions, or contexts related to the topic.
4. **Visual Appeal:** Categories should be visually interesting and appeal to various age groups.
5. **Text Instructions:** If text is present in the image, make sure text is outlined to allow for easy coloring.
6. **Simplicity:** Ensure the categories are easy to understand, with a limited number of objects and characters to be easily depicted by image generation models.

### Output Requirements:

- Respond with a JSON object of the form {"categories": ["...", "..."]} holding 15 distinct categories.
- **Descriptive Phrases:** Each category should be a descriptive, evocative phrase.
- **Showcase Versatility:** Categories should showcase the topic's versatility.
- **Avoid Repetition:** Avoid repetitive or overly similar concepts.

### Example:

**Topic:** Cats
- Playtime Adventures: Cats playing with various toys and objects.
- Sleepy Moments: Cats in different cozy sleeping positions.
- Seasonal Fun: Cats participating in different seasonal activities.

**Important:** Be creative, unexpected, and ensure each category offers rich potential for engaging coloring book illustrations.
"#;

pub const CREATE_PROMPTS_SYSTEM_PROMPT: &str = r#"
You are tasked with generating 6 detailed prompts for creating illustrations suitable for a coloring book page based on the given topic and category. The illustrations should be minimalist in style, featuring clear outlines with thick lines on a white background, making them easy for young kids to color.

**Guidelines for generating prompts:**

1. Each prompt should be descriptive enough to convey the scene or concept clearly.
2. Focus on simple shapes and forms that can be easily understood and colored by children.
3. Ensure that the prompts encourage creativity and imagination while remaining straightforward.
4. Provide a variety of scenes or concepts within the given category to showcase its diversity.
5. The final illustrations should be engaging and visually appealing, suitable for young audiences.

**Output Requirements:**

* Respond with a JSON object of the form {"prompts": ["...", "..."]} holding 6 distinct prompts.
* Each prompt should be a clear, engaging sentence or two that encapsulates the scene to be illustrated.
* Each prompt should specify that the illustration is minimalist, with clear outlines and thick lines on a white background, easy for young kids to color.

**Example Category: Animals**
- Cheerful Lion on a Rock: A friendly lion standing on a rock with a big smile, surrounded by simple jungle leaves. Minimalist details outline coloring pages on a white background. Ensure the image is drawn as a clear outline with thick lines, making it easy for young kids to color.
- Playful Dolphin Jumping: A happy dolphin jumping out of the water with a few waves and bubbles. Sun and clouds in the background. Minimalist details outline coloring pages on a white background. Ensure the image is drawn as a clear outline with thick lines, making it easy for young kids to color.
"#;

pub const IMAGE_RENAME_SYSTEM_PROMPT: &str = r#"
Your task is to rename a file by shortening its current name without losing essential meaning.

Please follow these guidelines:
* The shortened name should be in Title Case in which the first letter of each word is capitalized.
* Ensure the shortened name is concise and informative.
* Avoid abbreviations that could confuse the user.
* Maintain clarity and meaningfulness of the file name.
* Reply with the shortened name only.

Example:
Original file name: "Tweety Bird: A nighttime scene featuring Tweety Bird flying playfully among large, puffy clouds, with a backdrop of a bright full moon and scattered stars. Minimalist details outline coloring pages on a white background."
Shortened file name: "Tweety Bird In A Starry Night Sky."
"#;

#[derive(Deserialize)]
struct CategoriesPayload {
    categories: Vec<String>,
}

#[derive(Deserialize)]
struct PromptsPayload {
    prompts: Vec<String>,
}

/// Strip a Markdown code fence some models wrap JSON in.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn non_blank(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn parse_categories(content: &str) -> Result<Vec<Category>, ServiceError> {
    let payload: CategoriesPayload = serde_json::from_str(strip_code_fence(content))?;
    Ok(non_blank(payload.categories))
}

pub fn parse_prompts(content: &str) -> Result<Vec<String>, ServiceError> {
    let payload: PromptsPayload = serde_json::from_str(strip_code_fence(content))?;
    Ok(non_blank(payload.prompts))
}

pub struct LlmCategoryService {
    client: Arc<ChatClient>,
}

impl LlmCategoryService {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CategoryService for LlmCategoryService {
    async fn categories(&self, topic: &Topic) -> Result<Vec<Category>, ServiceError> {
        let messages = [
            ChatMessage::system(CREATE_CATEGORIES_SYSTEM_PROMPT),
            ChatMessage::user(format!("The topic is {}", topic)),
        ];
        let content = self.client.complete(&messages, true).await?;
        parse_categories(&content)
    }
}

pub struct LlmPromptService {
    client: Arc<ChatClient>,
}

impl LlmPromptService {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PromptService for LlmPromptService {
    async fn prompts(&self, topic: &Topic, category: &str) -> Result<Vec<String>, ServiceError> {
        let messages = [
            ChatMessage::system(CREATE_PROMPTS_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "The topic is {}, and the category is {}",
                topic, category
            )),
        ];
        let content = self.client.complete(&messages, true).await?;
        parse_prompts(&content)
    }
}

pub struct LlmRenameService {
    client: Arc<ChatClient>,
}

impl LlmRenameService {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RenameService for LlmRenameService {
    async fn shorten(&self, text: &str) -> Result<String, ServiceError> {
        let messages = [
            ChatMessage::system(IMAGE_RENAME_SYSTEM_PROMPT),
            ChatMessage::user(format!("Filename: {}", text)),
        ];
        let name = self.client.complete(&messages, false).await?;
        // Models like to echo the example's quoting.
        Ok(name.trim().trim_matches('"').to_string())
    }
}
