use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use openapi_service::pagination::{
    HalProvider, HateoasPagination, HeaderPagination, JsonRfc5988Pagination,
};
use openapi_service::{ApiServiceBuilder, ApiServiceConfig, CallOutput, Params, StaticSchema};
use serde_json::Value;

use crate::output::{print_json, print_raw_response};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PaginationKind {
    /// X-Page / X-Per-Page / X-Total-* headers plus a Link header
    Header,
    /// HAL body with `_links` and `_embedded`
    Hal,
    /// page/perPage/totalItems/totalPages keys in the body
    Hateoas,
    /// X-Pagination-* headers plus a Link header
    Rfc5988,
}

#[derive(Args)]
pub struct CallArgs {
    /// Operation id to call
    pub operation: String,

    /// Parameter as name=value; the value is read as JSON when it parses, else as a string
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, Value)>,

    /// Override the base URI declared by the catalogue
    #[arg(long)]
    pub base_uri: Option<String>,

    /// Skip request validation
    #[arg(long)]
    pub no_validate: bool,

    /// Validate the response against the catalogue
    #[arg(long)]
    pub validate_response: bool,

    /// Print the raw response instead of a resource
    #[arg(long)]
    pub raw: bool,

    /// Pagination style of array responses
    #[arg(long, value_enum)]
    pub pagination: Option<PaginationKind>,
}

pub async fn run(args: &CallArgs, schema: StaticSchema) -> Result<()> {
    let config = apply_flags(ApiServiceConfig::from_env()?, args);

    let mut builder = ApiServiceBuilder::new()
        .with_reqwest_client()?
        .with_config(config);
    builder = match args.pagination {
        Some(PaginationKind::Header) => builder.with_pagination_provider(HeaderPagination::default()),
        Some(PaginationKind::Hal) => builder.with_pagination_provider(HalProvider::default()),
        Some(PaginationKind::Hateoas) => {
            builder.with_pagination_provider(HateoasPagination::default())
        }
        Some(PaginationKind::Rfc5988) => {
            builder.with_pagination_provider(JsonRfc5988Pagination::default())
        }
        None => builder,
    };
    let service = builder.build(schema)?;

    let params = collect_params(&args.params)?;
    match service.call_async(&args.operation, &params)?.await? {
        CallOutput::Resource(resource) => print_json(&resource),
        CallOutput::Response(response) => print_raw_response(&response),
    }

    Ok(())
}

fn apply_flags(mut config: ApiServiceConfig, args: &CallArgs) -> ApiServiceConfig {
    if let Some(base_uri) = &args.base_uri {
        config.base_uri = Some(base_uri.clone());
    }
    if args.no_validate {
        config.validate_request = false;
    }
    if args.validate_response {
        config.validate_response = true;
    }
    if args.raw {
        config.return_response = true;
    }
    config
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("missing parameter name in '{}'", raw));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

fn collect_params(pairs: &[(String, Value)]) -> Result<Params> {
    let mut params = Params::new();
    for (name, value) in pairs {
        if params.insert(name.clone(), value.clone()).is_some() {
            bail!("parameter '{}' given more than once", name);
        }
    }
    Ok(params)
}
