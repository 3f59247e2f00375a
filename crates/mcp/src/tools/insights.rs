use std::sync::Arc;

use sdlc_toolbox_core::{
    ErrorEnvelope, ParamDescriptor, ParamType, RegistrationError, Tool, ToolContext,
    ToolDescriptor, ToolOutcome, ToolRegistry,
};

use crate::integrations::{user_activity_query, InsightsClient, DEFAULT_TIMESPAN};

fn timespan_param() -> ParamDescriptor {
    ParamDescriptor::required(
        "timespan",
        ParamType::String,
        "ISO-8601 duration to look back over, e.g. PT12H, P1D, P7D",
    )
    .with_default(DEFAULT_TIMESPAN)
}

fn run_query(
    client: &InsightsClient,
    kql: &str,
    timespan: &str,
    ctx: &mut ToolContext,
) -> ToolOutcome {
    ctx.debug(format!("Querying {} over {}", client.query_url(), timespan));
    ctx.debug(format!("KQL: {}", kql));

    match client.query(kql, timespan) {
        Ok(tables) => ToolOutcome::Json(tables),
        Err(err) => {
            ctx.error(format!("Error querying Application Insights: {}", err));
            ErrorEnvelope::upstream("Failed to query Application Insights", &err).into()
        }
    }
}

pub fn register(
    registry: &mut ToolRegistry,
    client: Arc<InsightsClient>,
) -> Result<(), RegistrationError> {
    let query_client = client.clone();
    registry.register(Tool::new(
        ToolDescriptor::new(
            "query_app_insights",
            "Run a KQL query against Application Insights and return the result tables.",
        )
        .param(ParamDescriptor::required("query", ParamType::String, "KQL query text"))
        .param(timespan_param()),
        move |args, ctx| run_query(&query_client, args.str("query"), args.str("timespan"), ctx),
    ))?;

    registry.register(Tool::new(
        ToolDescriptor::new(
            "get_user_activity",
            "Get the requests made by one authenticated user in Application Insights: \
             timestamp, name, url, result code and duration.",
        )
        .param(ParamDescriptor::required(
            "user_id",
            ParamType::String,
            "The authenticated user id, usually an email address",
        ))
        .param(timespan_param()),
        move |args, ctx| {
            let kql = user_activity_query(args.str("user_id"));
            run_query(&client, &kql, args.str("timespan"), ctx)
        },
    ))?;

    Ok(())
}
