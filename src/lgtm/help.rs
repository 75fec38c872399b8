use serde::Serialize;

/// Describes what the bot does and which commands it understands.
#[derive(Serialize, Debug)]
pub struct PluginHelp {
    pub description: &'static str,
    pub commands: Vec<CommandHelp>,
}

#[derive(Serialize, Debug)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
    pub featured: bool,
    pub who_can_use: &'static str,
    pub examples: Vec<&'static str>,
}

pub fn plugin_help() -> PluginHelp {
    PluginHelp {
        description: "The lgtm plugin manages the application and removal of the 'lgtm' (Looks Good To Me) label which is typically used to gate merging.",
        commands: vec![CommandHelp {
            usage: "/lgtm [cancel]",
            description: "Adds or removes the 'lgtm' label which is typically used to gate merging.",
            featured: true,
            who_can_use: "Collaborators on the repository. '/lgtm cancel' can be used additionally by the PR author.",
            examples: vec!["/lgtm", "/lgtm cancel"],
        }],
    }
}
