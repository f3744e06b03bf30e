use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

use crate::config::HeartbeatConfig;
use crate::gemini_client::GeminiClient;
use crate::models::{Comment, PostSummary};
use crate::moltbook_client::MoltbookClient;
use crate::registry::{self, AgentPersona};

/// Terminal branch of one heartbeat run. Everything short of `Posted` is a
/// soft skip; the process still exits cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoPosts,
    NoAgents,
    AuthorSkip { agent: String, post_id: String },
    AlreadyCommented { agent: String, post_id: String },
    GenerationFailed { agent: String, post_id: String },
    PublishFailed { agent: String, post_id: String },
    Posted { agent: String, post_id: String },
}

pub struct Heartbeat {
    moltbook: MoltbookClient,
    gemini: GeminiClient,
    config: HeartbeatConfig,
    gemini_key: String,
    agents: HashMap<String, AgentPersona>,
}

impl Heartbeat {
    pub fn new(
        config: HeartbeatConfig,
        gemini_key: String,
        agents: HashMap<String, AgentPersona>,
    ) -> Self {
        Self {
            moltbook: MoltbookClient::new(config.moltbook_api_url.clone()),
            gemini: GeminiClient::new(config.gemini_api_url.clone()),
            config,
            gemini_key,
            agents,
        }
    }

    /// Run the pipeline once: fetch, select, check eligibility, generate,
    /// publish. Selection is uniform with no re-selection on an ineligible
    /// pairing, so many runs simply skip. Eligibility is check-then-act
    /// against the comments of a single detail fetch; overlapping scheduled
    /// runs can race past it.
    pub async fn run<R: Rng>(&self, rng: &mut R) -> Result<Outcome> {
        let main_agents = registry::main_agents(&self.agents);
        if main_agents.is_empty() {
            tracing::info!("No main agents configured");
            return Ok(Outcome::NoAgents);
        }

        let posts = self.moltbook.get_recent_posts(self.config.fetch_limit).await?;
        let Some(post) = posts.choose(rng) else {
            tracing::info!("No posts found");
            return Ok(Outcome::NoPosts);
        };
        tracing::info!("Selected post: {}", post.title);

        let detail = self.moltbook.get_post(&post.id).await?;

        let (agent_name, persona) = main_agents[rng.gen_range(0..main_agents.len())];

        let author = post.agent.as_ref().map(|a| a.name.as_str());
        if author == Some(agent_name) {
            tracing::info!("Skipping: {} is the author", agent_name);
            return Ok(Outcome::AuthorSkip {
                agent: agent_name.to_string(),
                post_id: post.id.clone(),
            });
        }

        let already_commented = detail
            .comments
            .iter()
            .filter_map(|c| c.agent.as_ref())
            .any(|a| a.name == agent_name);
        if already_commented {
            tracing::info!("Skipping: {} already commented", agent_name);
            return Ok(Outcome::AlreadyCommented {
                agent: agent_name.to_string(),
                post_id: post.id.clone(),
            });
        }

        tracing::info!("Generating comment as {}...", agent_name);
        let prompt = build_prompt(
            persona,
            post,
            &detail.comments,
            self.config.comment_context_limit,
        );

        let comment = self
            .gemini
            .generate(
                &self.gemini_key,
                &prompt,
                self.config.temperature,
                self.config.max_output_tokens,
            )
            .await?;

        let Some(comment) = comment else {
            tracing::info!("Failed to generate comment");
            return Ok(Outcome::GenerationFailed {
                agent: agent_name.to_string(),
                post_id: post.id.clone(),
            });
        };

        let preview: String = comment.chars().take(100).collect();
        tracing::info!("Comment: {}...", preview);

        let posted = self
            .moltbook
            .create_comment(&post.id, &persona.api_key, comment, None)
            .await?;

        if posted {
            tracing::info!("Comment posted successfully by {}", agent_name);
            Ok(Outcome::Posted {
                agent: agent_name.to_string(),
                post_id: post.id.clone(),
            })
        } else {
            tracing::info!("Failed to post comment");
            Ok(Outcome::PublishFailed {
                agent: agent_name.to_string(),
                post_id: post.id.clone(),
            })
        }
    }
}

/// Assemble the persona prompt from agent attributes, the post, and up to
/// `context_limit` existing comments.
fn build_prompt(
    persona: &AgentPersona,
    post: &PostSummary,
    comments: &[Comment],
    context_limit: usize,
) -> String {
    let context = if comments.is_empty() {
        "none".to_string()
    } else {
        comments
            .iter()
            .take(context_limit)
            .map(|c| {
                let author = c.agent.as_ref().map(|a| a.name.as_str()).unwrap_or("anonymous");
                format!("- {}: {}", author, c.body)
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are an AI agent playing the character \"{personality}\".\n\n\
         Style: {style}\n\n\
         Write a comment on the post below that stays in character.\n\
         If there are existing comments, take them into account in your reply.\n\n\
         ---\n\
         Post title: {title}\n\
         Post body:\n\
         {body}\n\n\
         ---\n\
         Existing comments:\n\
         {context}\n\n\
         ---\n\
         Instructions:\n\
         - Keep it concise, around 100-200 characters\n\
         - Let the character's personality come through\n\
         - Move the discussion forward\n\n\
         Comment:",
        personality = persona.personality,
        style = persona.style,
        title = post.title,
        body = post.body,
        context = context,
    )
}
