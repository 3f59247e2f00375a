use std::sync::Arc;

use sdlc_toolbox_core::{
    RegistrationError, Tool, ToolContext, ToolDescriptor, ToolOutcome, ToolRegistry,
};

use crate::integrations::{TemplateError, TemplateStore};

const TEMPLATE_TOOLS: &[(&str, &str, &str)] = &[
    (
        "get_template_decision_log",
        "decision-log",
        "Get the template used for decision logs in the Software delivery lifecycle of this IT \
         delivery. The template is mainly used for Architecture Decision Records (ADRs), but can \
         also be used for other decisions within the delivery.",
    ),
    (
        "get_template_incident_report",
        "incident-report-postmortem",
        "Get the template used for incident reports (aka. postmortem) in the Software delivery \
         lifecycle of this IT delivery. The incident report captures the details of an incident, \
         including the timeline, root cause analysis, and action items.",
    ),
    (
        "get_template_user_story",
        "user-story",
        "Get the template used for user stories in the Software delivery lifecycle of this IT \
         delivery. The user story template is used to capture the requirements and acceptance \
         criteria for a feature or functionality.",
    ),
];

fn read_template(store: &TemplateStore, template_id: &str, ctx: &mut ToolContext) -> ToolOutcome {
    ctx.debug(format!("Preparing reading template {}", template_id));

    match store.read(template_id) {
        Ok(content) => ToolOutcome::Text(content),
        Err(err) => {
            match &err {
                TemplateError::Unsupported(id) => {
                    ctx.error(format!("Unknown template type: {}", id))
                }
                TemplateError::NotFound(_) => {
                    ctx.error(format!("Template file not found in {}", store.location()))
                }
                TemplateError::Io(_) => ctx.error(err.to_string()),
            }
            ToolOutcome::failure(format!("Error: {}", err))
        }
    }
}

pub fn register(
    registry: &mut ToolRegistry,
    store: Arc<TemplateStore>,
) -> Result<(), RegistrationError> {
    for (name, template_id, description) in TEMPLATE_TOOLS {
        let store = store.clone();
        registry.register(Tool::new(
            ToolDescriptor::new(*name, *description),
            move |_args, ctx| read_template(&store, template_id, ctx),
        ))?;
    }

    Ok(())
}
