use openapi_service::StaticSchema;

use crate::output::{print_json, print_operations_table, OutputFormat};

pub fn run(schema: &StaticSchema, format: &OutputFormat) {
    match format {
        OutputFormat::Table => print_operations_table(schema.operations()),
        OutputFormat::Json => print_json(&schema.operations()),
    }
}
