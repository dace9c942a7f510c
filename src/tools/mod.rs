//! Tools Module
//!
//! Each tool lives in its own module exporting a `register` function that adds
//! the tool definition and its handler to the registry. All four tools share a
//! `ToolContext` carrying the injected text generator.

pub mod analyze;
pub mod batch;
pub mod lookup;
pub mod reply;
pub mod route;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::config::GenerationOverride;
use crate::core::error::ToolError;
use crate::core::server::{ToolFuture, ToolHandler, ToolRegistry};
use crate::gemini::{GenerationParams, TextGenerator};

/// Tools whose generation settings fall back to another tool's override when
/// they have none of their own.
const INHERITED_OVERRIDES: &[(&str, &str)] = &[(batch::NAME, analyze::NAME)];

/// Shared, read-only state handed to every tool call.
#[derive(Clone)]
pub struct ToolContext {
    generator: Arc<dyn TextGenerator>,
    overrides: Arc<HashMap<String, GenerationOverride>>,
}

impl ToolContext {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            overrides: Arc::new(HashMap::new()),
        }
    }

    /// Attach per-tool generation overrides from the config file.
    pub fn with_overrides(mut self, overrides: HashMap<String, GenerationOverride>) -> Self {
        self.overrides = Arc::new(overrides);
        self
    }

    /// Generation parameters for `tool` after applying any configured override.
    ///
    /// A tool's own entry replaces an inherited one entirely.
    pub fn params_for(&self, tool: &str, defaults: GenerationParams) -> GenerationParams {
        self.overrides
            .get(tool)
            .or_else(|| {
                INHERITED_OVERRIDES
                    .iter()
                    .find(|(child, _)| *child == tool)
                    .and_then(|(_, parent)| self.overrides.get(*parent))
            })
            .map(|o| o.apply(defaults))
            .unwrap_or(defaults)
    }

    /// Send a prompt on behalf of `tool` and decode the reply into `T`.
    pub async fn ask<T: DeserializeOwned>(
        &self,
        tool: &str,
        prompt: &str,
        defaults: GenerationParams,
    ) -> Result<T, ToolError> {
        let params = self.params_for(tool, defaults);
        tracing::debug!(
            tool,
            temperature = params.temperature,
            max_output_tokens = params.max_output_tokens,
            prompt_len = prompt.len(),
            "sending prompt"
        );

        let raw = self.generator.generate(prompt, params).await?;
        reply::decode(&raw)
    }
}

/// Register all tools, in the order `tools/list` reports them.
pub fn register_all(registry: &mut ToolRegistry, context: &ToolContext) {
    analyze::register(registry, context);
    lookup::register(registry, context);
    batch::register(registry, context);
    route::register(registry, context);
}

/// Decode the raw `arguments` object of a `tools/call` into a typed struct.
pub fn decode_args<A: DeserializeOwned>(args: Value) -> Result<A, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// Build a registry handler from an async function over typed arguments.
///
/// Argument decoding happens before `run` is invoked, so a missing required
/// argument never reaches the generator.
pub(crate) fn typed_handler<A, F, Fut>(context: &ToolContext, run: F) -> ToolHandler
where
    A: DeserializeOwned + Send + 'static,
    F: Fn(ToolContext, A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    let context = context.clone();
    Box::new(move |args: Value| -> ToolFuture {
        match decode_args::<A>(args) {
            Ok(args) => run(context.clone(), args).boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    })
}
