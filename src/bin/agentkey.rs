use agentkey::agents::AgentRegistry;
use agentkey::api::{Collaborator, GeminiClient, ScriptedCollaborator};
use agentkey::app::App;
use agentkey::config::Config;
use agentkey::terminal;
use anyhow::{bail, Result};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    if !terminal::is_interactive() {
        bail!("agentkey needs an interactive terminal (stdin and stdout must be a TTY)");
    }

    let registry = Arc::new(AgentRegistry::builtin());
    let collaborator: Arc<dyn Collaborator> = if config.offline {
        Arc::new(ScriptedCollaborator::echo())
    } else {
        Arc::new(GeminiClient::new(&config, Arc::clone(&registry))?)
    };

    let mut app = App::new(&config, registry, collaborator);
    app.run().await?;

    Ok(())
}
