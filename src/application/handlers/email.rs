use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use super::delivery::{ChannelDispatch, DeliveryPipeline, DeliveryTally, DispatchHandler, Prepared};
use crate::{
    application::services::{
        channels::{Attachment, ChannelAdapter, EmailClient},
        template_renderer::{self, RenderError},
    },
    domain::{
        events::Envelope,
        models::{AttachmentMetadata, EmailMessage, Template},
    },
};

pub const DEFAULT_SUBJECT: &str = "Notification";

pub type EmailHandler = DispatchHandler<EmailDispatch>;

pub struct EmailDispatch;

#[async_trait]
impl ChannelDispatch for EmailDispatch {
    type Message = EmailMessage;
    type Client = dyn EmailClient;

    fn select(adapter: ChannelAdapter) -> Option<Arc<dyn EmailClient>> {
        adapter.into_email()
    }

    async fn deliver(
        &self,
        pipeline: &DeliveryPipeline,
        envelope: &Envelope<Self::Message>,
        prepared: &Prepared<Self::Client>,
    ) -> DeliveryTally {
        let message = &envelope.message;
        let mut tally = DeliveryTally::default();

        let subject =
            resolve_subject(message.subject.as_deref(), &message.params, &prepared.template);
        let attachments = decode_attachments(&message.attachments);

        for recipient in &message.to {
            let address = recipient.email.as_str();
            let outcome = match (
                &subject,
                template_renderer::render(&prepared.template.content, &message.params),
                &attachments,
            ) {
                (Err(err), _, _) => Err(format!("Failed to render subject for {address}: {err}")),
                (_, Err(err), _) => Err(format!("Failed to render template for {address}: {err}")),
                (_, _, Err(reason)) => Err(format!("Failed to send email to {address}: {reason}")),
                (Ok(subject), Ok(body), Ok(attachments)) => {
                    let to = [address.to_string()];
                    let sent = if attachments.is_empty() {
                        prepared.client.send(&to, subject, &body, true).await
                    } else {
                        prepared
                            .client
                            .send_with_attachments(&to, subject, &body, true, attachments)
                            .await
                    };
                    sent.map_err(|err| format!("Failed to send email to {address}: {err}"))
                }
            };
            pipeline
                .record(envelope.uuid, address, outcome, &mut tally)
                .await;
        }

        tally
    }
}

/// Picks the subject line: the request's own subject, then a `subject`
/// parameter, then the rendered template subject, then the template name.
/// A template subject that does not parse is an error, not a fallback.
pub fn resolve_subject(
    requested: Option<&str>,
    params: &HashMap<String, String>,
    template: &Template,
) -> Result<String, RenderError> {
    let explicit = requested
        .filter(|subject| !subject.trim().is_empty())
        .or_else(|| {
            params
                .get("subject")
                .map(String::as_str)
                .filter(|subject| !subject.trim().is_empty())
        });
    if let Some(subject) = explicit {
        return Ok(subject.to_string());
    }

    if let Some(raw) = template.subject.as_deref().filter(|s| !s.trim().is_empty()) {
        let rendered = template_renderer::render(raw, params)?;
        if !rendered.trim().is_empty() {
            return Ok(rendered);
        }
    }

    if !template.name.trim().is_empty() {
        return Ok(template.name.clone());
    }
    Ok(DEFAULT_SUBJECT.to_string())
}

fn decode_attachments(attachments: &[AttachmentMetadata]) -> Result<Vec<Attachment>, String> {
    attachments
        .iter()
        .map(|attachment| {
            let content = BASE64
                .decode(attachment.content.trim())
                .map_err(|err| format!("attachment {} is not valid base64: {err}", attachment.filename))?;
            Ok(Attachment {
                filename: attachment.filename.clone(),
                content_type: attachment.content_type.clone(),
                content,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::Map;
    use uuid::Uuid;

    use super::*;
    use crate::domain::models::{Channel, RecordStatus};

    fn template(subject: Option<&str>, name: &str) -> Template {
        Template {
            uuid: Uuid::new_v4(),
            code: "RECEIPT".into(),
            name: name.into(),
            subject: subject.map(str::to_string),
            content: "<p>Total {{total}}</p>".into(),
            status: RecordStatus::Active,
            channel: Channel::Email,
            template_ids: Map::new(),
            tenant: "acme".into(),
        }
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn subject_prefers_request_then_param() {
        let template = template(Some("Receipt {{order}}"), "Receipt");
        let p = params(&[("subject", "From params"), ("order", "42")]);

        assert_eq!(resolve_subject(Some("Explicit"), &p, &template).unwrap(), "Explicit");
        assert_eq!(resolve_subject(Some("  "), &p, &template).unwrap(), "From params");
        assert_eq!(
            resolve_subject(None, &params(&[("order", "42")]), &template).unwrap(),
            "Receipt 42"
        );
    }

    #[test]
    fn subject_falls_back_to_name_then_default() {
        assert_eq!(
            resolve_subject(None, &HashMap::new(), &template(None, "Receipt")).unwrap(),
            "Receipt"
        );
        assert_eq!(
            resolve_subject(None, &HashMap::new(), &template(Some("{{missing}}"), "")).unwrap(),
            DEFAULT_SUBJECT
        );
    }

    #[test]
    fn malformed_template_subject_is_an_error() {
        let err = resolve_subject(None, &HashMap::new(), &template(Some("Bad {{"), "Receipt"))
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::Unclosed { .. }));

        let explicit = resolve_subject(
            Some("Explicit"),
            &HashMap::new(),
            &template(Some("Bad {{"), "Receipt"),
        );
        assert_eq!(explicit.unwrap(), "Explicit");
    }

    #[test]
    fn attachments_are_decoded_once() {
        let decoded = decode_attachments(&[AttachmentMetadata {
            filename: "a.txt".into(),
            content_type: "text/plain".into(),
            content: BASE64.encode(b"hello"),
        }])
        .unwrap();
        assert_eq!(decoded[0].content, b"hello");

        let err = decode_attachments(&[AttachmentMetadata {
            filename: "b.pdf".into(),
            content_type: "application/pdf".into(),
            content: "***".into(),
        }])
        .unwrap_err();
        assert!(err.contains("b.pdf"));
    }
}
