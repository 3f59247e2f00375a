use std::sync::Arc;

use sdlc_toolbox_core::{
    ErrorEnvelope, ParamDescriptor, ParamType, RegistrationError, Tool, ToolDescriptor,
    ToolOutcome, ToolRegistry,
};

use crate::integrations::SlackWorkflow;

pub fn register(
    registry: &mut ToolRegistry,
    workflow: Arc<SlackWorkflow>,
) -> Result<(), RegistrationError> {
    registry.register(Tool::new(
        ToolDescriptor::new(
            "share_with_team_slack",
            "Share content with the team slack channel. The team slack channel is used to \
             communicate with the team members in our delivery for all parts of the Software \
             Delivery Lifecycle. The team has solid technical knowledge and understanding. \
             Use short precise content with high readability on slack (slack uses mrkdwn which \
             is a subset of markdown).",
        )
        .param(ParamDescriptor::required(
            "content",
            ParamType::String,
            "The content to share with the team slack channel. It could be a quick message or \
             a more technical analysis. Use the slack mrkdwn subset of markdown and strive for \
             high readability on slack. Emojis are ok to use",
        )),
        move |args, ctx| {
            ctx.debug("Preparing request to slack webhook");

            match workflow.share(args.str("content")) {
                Ok(reply) => ToolOutcome::Json(reply),
                Err(err) => {
                    ctx.error(format!("Error: {}", err));
                    ErrorEnvelope::upstream("Failed to share with team slack", &err).into()
                }
            }
        },
    ))?;

    Ok(())
}
