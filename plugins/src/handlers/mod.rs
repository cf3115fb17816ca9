//! Built-in document kinds: text, code and sheet.

pub mod code;
pub mod prompts;
pub mod sheet;
pub mod streaming;
pub mod text;

use std::sync::Arc;

use docstream_core::api::{DocumentKind, RegistryBuilder, StreamConfig, TokenSource};

pub use code::CodePlan;
pub use sheet::SheetPlan;
pub use streaming::{PromptPair, PromptPlan, Side, StreamSettings, StreamingOp};
pub use text::TextPlan;

/// Registers one kind whose create and update sides share a plan and source.
pub fn register_plan(
    builder: RegistryBuilder,
    kind: DocumentKind,
    plan: Arc<dyn PromptPlan>,
    source: Arc<dyn TokenSource>,
    settings: StreamSettings,
) -> RegistryBuilder {
    let on_create = StreamingOp::new(plan.clone(), Side::Create, source.clone(), settings.clone());
    let on_update = StreamingOp::new(plan, Side::Update, source, settings);
    builder.register(kind, Arc::new(on_create), Arc::new(on_update))
}

/// Text, code and sheet handlers against one token source. Only text is
/// word-smoothed.
pub fn register_builtin_handlers(
    builder: RegistryBuilder,
    source: Arc<dyn TokenSource>,
    model_id: &str,
    stream: &StreamConfig,
) -> RegistryBuilder {
    let plain = StreamSettings {
        model_id: model_id.to_string(),
        idle_timeout: stream.idle_timeout(),
        smoothing: None,
    };
    let smoothed = StreamSettings {
        smoothing: stream.smoothing.then(|| stream.smoothing_delay()),
        ..plain.clone()
    };

    let builder = register_plan(builder, DocumentKind::Text, Arc::new(TextPlan), source.clone(), smoothed);
    let builder = register_plan(builder, DocumentKind::Code, Arc::new(CodePlan), source.clone(), plain.clone());
    register_plan(builder, DocumentKind::Sheet, Arc::new(SheetPlan), source, plain)
}

#[cfg(test)]
mod tests {
    use super::streaming::testing::ScriptedSource;
    use super::*;
    use docstream_core::api::{DocumentError, HandlerRegistry, HandlerRequest, LiveChannel};

    #[tokio::test]
    async fn builtin_kinds_resolve_and_image_does_not() {
        let source = Arc::new(ScriptedSource::text(&["x"]));
        let registry: HandlerRegistry = register_builtin_handlers(
            HandlerRegistry::builder(),
            source.clone(),
            "artifact-model",
            &StreamConfig::default(),
        )
        .build();

        for kind in [DocumentKind::Text, DocumentKind::Code, DocumentKind::Sheet] {
            assert!(registry.resolve(kind).is_ok());
        }
        assert!(matches!(
            registry.resolve(DocumentKind::Image),
            Err(DocumentError::UnsupportedKind(DocumentKind::Image))
        ));

        let channel = LiveChannel::detached();
        let sheet = registry.resolve(DocumentKind::Sheet).unwrap();
        let body = sheet
            .on_create
            .run(HandlerRequest {
                kind: DocumentKind::Sheet,
                prompt: "Budget",
                existing_content: None,
                channel: &channel,
            })
            .await
            .unwrap();
        assert_eq!(body, "x");
        assert!(source.last_request().system_prompt.contains("csv format"));
    }
}
