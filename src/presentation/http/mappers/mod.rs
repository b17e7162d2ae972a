use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{
    application::usecases::{get_message::MessageWithEvents, produce_message::ProduceMessageResponse},
    domain::{
        errors::DomainError,
        models::{
            AttachmentMetadata, EmailMessage, EmailRecipient, Identifiers, MessageEvent,
            SmsMessage, SmsRecipient, WhatsAppAttachments, WhatsAppInlineAttachment,
            WhatsAppMessage, WhatsAppRecipient,
        },
    },
    presentation::http::{
        requests::{EmailMessageDto, SmsMessageDto, WhatsAppMessageDto},
        responses::{MessageDto, MessageEventDto, ProduceResultDto},
    },
};

fn map_identifiers(raw: HashMap<String, Value>) -> Result<Identifiers, DomainError> {
    let object: Map<String, Value> = raw.into_iter().collect();
    serde_json::from_value(Value::Object(object))
        .map_err(|err| DomainError::Validation(format!("invalid identifiers: {err}")))
}

pub fn map_whatsapp(dto: WhatsAppMessageDto) -> Result<WhatsAppMessage, DomainError> {
    Ok(WhatsAppMessage {
        template: dto.template,
        to: dto
            .to
            .into_iter()
            .map(|recipient| WhatsAppRecipient {
                name: recipient.name,
                telephone: recipient.telephone,
            })
            .collect(),
        provider: dto.provider,
        refno: dto.refno,
        categories: dto.categories,
        identifiers: map_identifiers(dto.identifiers)?,
        params: dto.params,
        attachments: dto.attachments.map(|attachments| WhatsAppAttachments {
            inline: attachments
                .inline
                .into_iter()
                .map(|inline| WhatsAppInlineAttachment {
                    filename: inline.filename,
                    media_type: inline.media_type,
                    content: inline.content,
                    content_id: inline.content_id,
                })
                .collect(),
        }),
    })
}

pub fn map_sms(dto: SmsMessageDto) -> Result<SmsMessage, DomainError> {
    Ok(SmsMessage {
        template: dto.template,
        to: dto
            .to
            .into_iter()
            .map(|recipient| SmsRecipient {
                telephone: recipient.telephone,
            })
            .collect(),
        provider: dto.provider,
        refno: dto.refno,
        categories: dto.categories,
        identifiers: map_identifiers(dto.identifiers)?,
        params: dto.params,
    })
}

pub fn map_email(dto: EmailMessageDto) -> Result<EmailMessage, DomainError> {
    Ok(EmailMessage {
        template: dto.template,
        to: dto
            .to
            .into_iter()
            .map(|recipient| EmailRecipient {
                name: recipient.name,
                email: recipient.email,
            })
            .collect(),
        provider: dto.provider,
        refno: dto.refno,
        categories: dto.categories,
        identifiers: map_identifiers(dto.identifiers)?,
        params: dto.params,
        subject: dto.subject,
        attachments: dto
            .attachments
            .into_iter()
            .map(|attachment| AttachmentMetadata {
                filename: attachment.filename,
                content_type: attachment.content_type,
                content: attachment.content,
            })
            .collect(),
    })
}

/// Converts a whole batch, naming the offending index on failure.
pub fn map_batch<D, M>(
    dtos: Vec<D>,
    map: fn(D) -> Result<M, DomainError>,
) -> Result<Vec<M>, DomainError> {
    dtos.into_iter()
        .enumerate()
        .map(|(index, dto)| {
            map(dto).map_err(|err| match err {
                DomainError::Validation(reason) => {
                    DomainError::Validation(format!("messages[{index}]: {reason}"))
                }
                other => other,
            })
        })
        .collect()
}

pub fn map_produced(response: ProduceMessageResponse) -> ProduceResultDto {
    ProduceResultDto {
        refno: response.refno,
        uuid: response.uuid,
    }
}

pub fn map_message(found: MessageWithEvents) -> MessageDto {
    let MessageWithEvents { message, events } = found;
    MessageDto {
        uuid: message.uuid,
        channel: message.channel.into(),
        refno: message.refno,
        status: message.status.into(),
        categories: message.categories,
        identifiers: serde_json::to_value(&message.identifiers).unwrap_or(Value::Null),
        created_at: message.created_at.to_rfc3339(),
        updated_at: message.updated_at.to_rfc3339(),
        events: events.iter().map(map_event).collect(),
    }
}

fn map_event(event: &MessageEvent) -> MessageEventDto {
    MessageEventDto {
        uuid: event.uuid,
        status: event.status.into(),
        reason: event.reason.clone(),
        metadata: event.metadata.clone(),
        timestamp: event.timestamp.to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::presentation::http::requests::SmsRecipientDto;

    fn sms(identifiers: HashMap<String, Value>) -> SmsMessageDto {
        SmsMessageDto {
            template: "otp".into(),
            to: vec![SmsRecipientDto {
                telephone: "+15550100".into(),
            }],
            provider: "b3c1f1de-8f83-4a4c-9d1e-0b1c4a3f2e10".into(),
            refno: "REF-9".into(),
            categories: vec!["auth".into()],
            identifiers,
            params: HashMap::new(),
        }
    }

    #[test]
    fn identifiers_keep_known_and_extra_keys() {
        let identifiers = HashMap::from([
            ("tenant".to_string(), json!("acme")),
            ("eventId".to_string(), json!("evt-1")),
            ("region".to_string(), json!("eu")),
        ]);
        let message = map_sms(sms(identifiers)).unwrap();
        assert_eq!(message.identifiers.tenant, "acme");
        assert_eq!(message.identifiers.event_id.as_deref(), Some("evt-1"));
        assert_eq!(message.identifiers.extra["region"], "eu");
    }

    #[test]
    fn malformed_identifiers_name_the_batch_index() {
        let good = sms(HashMap::from([("tenant".to_string(), json!("acme"))]));
        let bad = sms(HashMap::from([("tenant".to_string(), json!(42))]));
        let err = map_batch(vec![good, bad], map_sms).err().unwrap();
        assert!(matches!(
            err,
            DomainError::Validation(reason) if reason.starts_with("messages[1]: ")
        ));
    }
}
