pub mod channel;
pub mod email;
pub mod message;
pub mod message_event;
pub mod provider;
pub mod sms;
pub mod template;
pub mod whatsapp;

pub use channel::{Channel, ChannelMessage};
pub use email::{AttachmentMetadata, EmailMessage, EmailRecipient};
pub use message::{Identifiers, Message, MessageStatus, NewMessage};
pub use message_event::{CREATED_DURING_PROCESSING, MessageEvent, NewMessageEvent};
pub use provider::{DeliveryStatus, Provider};
pub use sms::{SmsMessage, SmsRecipient};
pub use template::{RecordStatus, Template};
pub use whatsapp::{WhatsAppAttachments, WhatsAppInlineAttachment, WhatsAppMessage, WhatsAppRecipient};
