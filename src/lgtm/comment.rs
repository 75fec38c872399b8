use itertools::Itertools;

use crate::lgtm::event::PullRequestComment;

/// A comment that can be posted to a pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    text: String,
}

impl Comment {
    pub fn new(text: String) -> Self {
        Self { text }
    }

    /// Creates a reply to a comment that triggered the bot.
    ///
    /// The reply mentions the author of the triggering comment and quotes it, so that it is clear
    /// what the bot is reacting to.
    pub fn response(trigger: &PullRequestComment, message: &str) -> Self {
        let quoted = trigger.text.split('\n').map(|line| format!(">{line}")).join("\n");
        Self {
            text: format!(
                r#"@{}: {message}

<details>

In response to [this]({}):

{quoted}
</details>"#,
                trigger.author.username, trigger.html_url
            ),
        }
    }

    pub fn render(&self) -> &str {
        &self.text
    }
}
