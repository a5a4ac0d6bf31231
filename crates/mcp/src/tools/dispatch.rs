// Dispatch table: tool name -> forwarding recipe

use crate::tools::catalog::ToolCatalog;
use crate::tools::recipes::RECIPES;
use bugrelay_client::{normalize, Forward, ForwardError, ForwardingRecipe, NormalizedError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Exhaustive mapping from tool name to recipe, bound to a forwarder.
///
/// Lookup is exact and case-sensitive. The table never consults the catalog's
/// schemas: the catalog advertises shape, the table encodes behavior.
pub struct DispatchTable {
    recipes: &'static [ForwardingRecipe],
    index: HashMap<&'static str, usize>,
    forwarder: Arc<dyn Forward>,
}

/// Disagreements between the advertised catalog and the dispatch table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Advertised tools with no recipe. Calls to them fail as unknown tools.
    pub unroutable: Vec<String>,
    /// Routable tools no catalog source advertises.
    pub unadvertised: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.unroutable.is_empty() && self.unadvertised.is_empty()
    }
}

impl DispatchTable {
    /// The standard BugRelay table.
    pub fn new(forwarder: Arc<dyn Forward>) -> Self {
        Self::with_recipes(RECIPES, forwarder)
    }

    pub fn with_recipes(recipes: &'static [ForwardingRecipe], forwarder: Arc<dyn Forward>) -> Self {
        let index = recipes
            .iter()
            .enumerate()
            .map(|(i, recipe)| (recipe.tool, i))
            .collect();
        Self {
            recipes,
            index,
            forwarder,
        }
    }

    pub fn recipe(&self, name: &str) -> Option<&'static ForwardingRecipe> {
        let recipes = self.recipes;
        self.index.get(name).map(|&i| &recipes[i])
    }

    /// Tool names in table order.
    pub fn tool_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.recipes.iter().map(|recipe| recipe.tool)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Run one tool invocation. Every failure comes back normalized.
    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, NormalizedError> {
        let Some(recipe) = self.recipe(name) else {
            warn!(tool = %name, "Unknown tool requested");
            return Err(normalize(&ForwardError::UnknownTool(name.to_string())));
        };

        let arguments = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            _ => {
                return Err(normalize(&ForwardError::InvalidArgument {
                    field: "arguments".to_string(),
                    reason: "expected an object".to_string(),
                }))
            }
        };

        let started = Instant::now();
        match self.forwarder.forward(recipe, arguments).await {
            Ok(value) => {
                info!(
                    tool = recipe.tool,
                    method = %recipe.method,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                Ok(value)
            }
            Err(e) => {
                warn!(
                    tool = recipe.tool,
                    method = %recipe.method,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "Tool call failed"
                );
                Err(normalize(&e))
            }
        }
    }

    /// Compare the table against an advertised catalog and log every mismatch.
    pub fn check_catalog(&self, catalog: &ToolCatalog) -> ConsistencyReport {
        let report = ConsistencyReport {
            unroutable: catalog
                .list()
                .iter()
                .filter(|descriptor| self.recipe(&descriptor.name).is_none())
                .map(|descriptor| descriptor.name.clone())
                .collect(),
            unadvertised: self
                .tool_names()
                .filter(|name| !catalog.contains(name))
                .map(str::to_string)
                .collect(),
        };

        for name in &report.unroutable {
            warn!(tool = %name, "Catalog advertises a tool with no dispatch entry");
        }
        for name in &report.unadvertised {
            warn!(tool = %name, "Dispatch entry missing from the catalog");
        }

        report
    }
}
