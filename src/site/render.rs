//! Handlebars rendering with the helpers and partials the site templates use.
//!
//! `PageRenderer` owns its registry. It is built once at startup and shared
//! through `AppState`; nothing is registered globally.
//!
//! | Helper            | Behavior                                                  |
//! |-------------------|-----------------------------------------------------------|
//! | `{{#eachFlat x}}` | iterate `flatten(x)`: `this` is the leaf, `@key` its path |
//! | `{{json x}}`      | JSON-encode `x`                                           |
//! | `{{lt a b}}`      | `a < b` for numbers (numeric strings count) or strings    |
//! | `{{lte a b}}`     | `a <= b`, same rules                                      |
//! | `{{eq a b}}`      | strict equality; numbers compare by value                 |

use std::cmp::Ordering;
use std::path::Path;

use handlebars::{
    BlockContext, Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext,
    RenderErrorReason, Renderable, handlebars_helper,
};
use serde_json::Value;

use crate::errors::SiteError;
use crate::path_transform::flatten;

/// Subdirectory of the templates directory holding partials.
pub const PARTIALS_DIR: &str = "partials";

/// Partial the stock landing templates include.
pub const SPINWHEEL_PARTIAL: &str = "spinwheel";

pub struct PageRenderer {
    registry: Handlebars<'static>,
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("eachFlat", Box::new(EachFlatHelper));
        registry.register_helper("json", Box::new(json_encode));
        registry.register_helper("lt", Box::new(less_than));
        registry.register_helper("lte", Box::new(less_or_equal));
        registry.register_helper("eq", Box::new(strict_equal));
        Self { registry }
    }

    /// Register a partial under `name`.
    pub fn register_partial(&mut self, name: &str, source: &str) -> Result<(), SiteError> {
        self.registry.register_partial(name, source)?;
        Ok(())
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    /// Register every `*.hbs` file in `<templates>/partials`, named by file
    /// stem. Returns the number registered; a missing directory registers none.
    pub async fn load_partials(&mut self, templates_dir: &Path) -> Result<usize, SiteError> {
        let dir = templates_dir.join(PARTIALS_DIR);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "no partials directory");
                return Ok(0);
            }
            Err(e) => return Err(SiteError::io(&dir, e)),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await.map_err(|e| SiteError::io(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("hbs") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let source = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| SiteError::io(&path, e))?;
            self.register_partial(name, &source)?;
            tracing::debug!(partial = name, "registered partial");
            count += 1;
        }
        Ok(count)
    }

    /// Compile `source` and render it against `data`.
    pub fn render(&self, source: &str, data: &Value) -> Result<String, SiteError> {
        Ok(self.registry.render_template(source, data)?)
    }
}

/// Block helper iterating the flattened form of its argument.
struct EachFlatHelper;

impl HelperDef for EachFlatHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let param = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("eachFlat", 0))?;
        let Some(template) = h.template() else {
            return Ok(());
        };

        for (key, value) in flatten(param.value()) {
            let mut block = BlockContext::new();
            block.set_base_value(value);
            block.set_local_var("key", Value::String(key));
            rc.push_block(block);
            template.render(r, ctx, rc, out)?;
            rc.pop_block();
        }
        Ok(())
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

fn strictly_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

handlebars_helper!(json_encode: |value: Json| serde_json::to_string(value).unwrap_or_default());
handlebars_helper!(less_than: |a: Json, b: Json| compare(a, b) == Some(Ordering::Less));
handlebars_helper!(less_or_equal: |a: Json, b: Json| {
    matches!(compare(a, b), Some(Ordering::Less | Ordering::Equal))
});
handlebars_helper!(strict_equal: |a: Json, b: Json| strictly_equal(a, b));
