use chrono::Utc;
use serde_json::json;

use sdlc_toolbox_core::{
    ParamDescriptor, ParamType, RegistrationError, Tool, ToolDescriptor, ToolOutcome,
    ToolRegistry,
};

use crate::integrations::current_datetime;

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistrationError> {
    registry.register(Tool::new(
        ToolDescriptor::new(
            "get_current_datetime",
            "Get the current date and time in various formats",
        )
        .param(
            ParamDescriptor::required(
                "format",
                ParamType::String,
                "Format of the date and time (iso, locale, unix)",
            )
            .with_default("iso"),
        )
        .param(ParamDescriptor::optional(
            "timezone",
            ParamType::String,
            "Timezone for the date and time (e.g., \"America/New_York\", \"Europe/London\")",
        )),
        |args, ctx| {
            let format = args.opt_str("format").unwrap_or("iso");
            match current_datetime(format, args.opt_str("timezone"), Utc::now()) {
                Ok(report) => ToolOutcome::Json(json!(report)),
                Err(err) => {
                    ctx.error(err.to_string());
                    ToolOutcome::failure(format!("Error getting date and time: {}", err))
                }
            }
        },
    ))?;

    Ok(())
}
