//! Conversation synchronizer — reconciles classified events against
//! stored conversation/message state and decides which domain events to
//! emit.
//!
//! Persistence failures during reconciliation are logged with the event
//! id and type, marked on the outcome, and never abort processing: an
//! event that cannot be stored is still forwarded downstream rather than
//! silently dropped.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{error, warn};

use crate::models::conversation::{
    conversation_id, conversation_id_for_ref, Conversation, ConversationStatus,
};
use crate::models::domain_event::{
    AnalyticsPayload, ConversationPayload, DomainEvent, MessagePayload, WebhookPayload,
};
use crate::models::event::{
    CommentEvent, EventMeta, TicketEvent, TicketSnapshot, UnknownEvent, WebhookEvent,
};
use crate::models::installation::Installation;
use crate::models::message::{description_message_id, message_id, Message, MessageSender};
use crate::persistence::conversation_repo::ConversationRepo;
use crate::persistence::db::Database;
use crate::persistence::message_repo::MessageRepo;
use crate::sync::delta::ConversationDelta;

/// Result of applying one classified event.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// Domain events to hand to the publisher, in emission order.
    pub events: Vec<DomainEvent>,
    /// Whether any persistence operation failed along the way.
    pub storage_degraded: bool,
}

/// Applies classified events to stored state and produces domain events.
pub struct ConversationSynchronizer {
    conversations: ConversationRepo,
    messages: MessageRepo,
}

impl ConversationSynchronizer {
    /// Create a synchronizer over the shared database pool.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            conversations: ConversationRepo::new(Arc::clone(&db)),
            messages: MessageRepo::new(db),
        }
    }

    /// Apply a classified event, returning the domain events to publish.
    pub async fn apply(&self, event: &WebhookEvent, installation: &Installation) -> SyncOutcome {
        match event {
            WebhookEvent::TicketCreated(e) => self.apply_ticket_created(e).await,
            WebhookEvent::TicketUpdated(e) | WebhookEvent::TicketStatusChanged(e) => {
                self.apply_ticket_updated(e).await
            }
            WebhookEvent::CommentCreated(e) => self.apply_comment_created(e, installation).await,
            WebhookEvent::CommentUpdated(e) => self.apply_comment_updated(e).await,
            WebhookEvent::Unknown(e) => Self::apply_unknown(e),
        }
    }

    async fn apply_ticket_created(&self, event: &TicketEvent) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let conversation = conversation_from_snapshot(&event.current, &event.meta);

        self.upsert_conversation(&conversation, &event.meta, &mut outcome)
            .await;

        outcome
            .events
            .push(DomainEvent::ConversationCreated(conversation_payload(
                &conversation,
                &event.meta,
                None,
            )));

        // An initial description becomes the conversation's first
        // message, attributed to the requester. The deterministic id
        // makes replays of the same created-event converge instead of
        // duplicating it.
        if let Some(description) = event.current.description.as_deref() {
            if !description.is_empty() {
                let now = Utc::now();
                let message = Message {
                    id: description_message_id(event.current.id),
                    conversation_id: conversation.id.clone(),
                    content: description.to_owned(),
                    sender: MessageSender::Customer,
                    channel: None,
                    metadata: json!({
                        "synthesized": true,
                        "requester_id": event.current.requester_id,
                    }),
                    created_at: now,
                    updated_at: now,
                };
                self.upsert_message(&message, &event.meta, &mut outcome).await;

                outcome.events.push(DomainEvent::MessageCreated(MessagePayload {
                    message_id: message.id,
                    conversation_id: message.conversation_id,
                    content: message.content,
                    sender: message.sender,
                    metadata: json!({ "event_id": event.meta.id }),
                }));
            }
        }

        outcome
    }

    async fn apply_ticket_updated(&self, event: &TicketEvent) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let conversation = conversation_from_snapshot(&event.current, &event.meta);

        self.upsert_conversation(&conversation, &event.meta, &mut outcome)
            .await;

        let delta = event
            .previous
            .as_ref()
            .map(|previous| ConversationDelta::between(previous, &event.current))
            .unwrap_or_default();

        let delta_json = serde_json::to_value(&delta).unwrap_or_else(|_| json!({}));
        outcome
            .events
            .push(DomainEvent::ConversationUpdated(conversation_payload(
                &conversation,
                &event.meta,
                Some(delta_json),
            )));

        if delta.assignee_changed() {
            outcome
                .events
                .push(DomainEvent::AnalyticsComputed(AnalyticsPayload {
                    conversation_id: conversation.id.clone(),
                    metric_type: "assignment_change".into(),
                    value: 1.0,
                    aggregation_type: "count".into(),
                    time_window: "instant".into(),
                }));
        }

        if conversation.status.is_terminal() {
            outcome
                .events
                .push(DomainEvent::AnalyticsComputed(AnalyticsPayload {
                    conversation_id: conversation.id.clone(),
                    metric_type: "conversation_completed".into(),
                    value: 1.0,
                    aggregation_type: "count".into(),
                    time_window: "instant".into(),
                }));
        }

        outcome
    }

    async fn apply_comment_created(
        &self,
        event: &CommentEvent,
        installation: &Installation,
    ) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();

        // The envelope subject carries the external ticket reference the
        // comment belongs to; without it there is nothing to attach the
        // message to, so the event is forwarded opaquely instead.
        let Some(ticket_ref) = event.meta.subject.as_deref() else {
            warn!(
                event_id = %event.meta.id,
                "comment event without envelope subject; forwarding opaquely"
            );
            outcome.events.push(DomainEvent::Webhook(WebhookPayload {
                source: "zendesk".into(),
                event_type: event.meta.event_type.clone(),
                payload: json!({ "comment_id": event.current.id }),
            }));
            return outcome;
        };

        let conversation_id = conversation_id_for_ref(ticket_ref);
        self.ensure_conversation(&conversation_id, ticket_ref, &event.meta, &mut outcome)
            .await;

        let sender = MessageSender::from_visibility(event.current.public);
        let now = Utc::now();
        let message = Message {
            id: message_id(event.current.id),
            conversation_id: conversation_id.clone(),
            content: event.current.body.clone().unwrap_or_default(),
            sender,
            channel: event.current.channel.clone(),
            metadata: json!({ "author_id": event.current.author_id }),
            created_at: now,
            updated_at: now,
        };
        self.upsert_message(&message, &event.meta, &mut outcome).await;

        outcome.events.push(DomainEvent::MessageCreated(MessagePayload {
            message_id: message.id.clone(),
            conversation_id: conversation_id.clone(),
            content: message.content.clone(),
            sender,
            metadata: json!({ "event_id": event.meta.id }),
        }));

        if installation.settings.sentiment_enabled {
            outcome.events.push(DomainEvent::Webhook(WebhookPayload {
                source: "enrichment".into(),
                event_type: "sentiment.requested".into(),
                payload: json!({
                    "messageId": message.id,
                    "conversationId": conversation_id,
                    "content": message.content,
                }),
            }));
        }

        if installation.settings.suggestions_enabled && sender == MessageSender::Customer {
            outcome.events.push(DomainEvent::Webhook(WebhookPayload {
                source: "enrichment".into(),
                event_type: "suggestion.requested".into(),
                payload: json!({
                    "messageId": message.id,
                    "conversationId": conversation_id,
                    "content": message.content,
                }),
            }));
        }

        outcome
    }

    async fn apply_comment_updated(&self, event: &CommentEvent) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        let id = message_id(event.current.id);
        let content = event.current.body.clone().unwrap_or_default();

        // Sender classification is decided once at creation and never
        // recomputed on updates; prefer the stored record when we have
        // one.
        let stored = match self.messages.get_by_id(&id).await {
            Ok(stored) => stored,
            Err(err) => {
                error!(
                    event_id = %event.meta.id,
                    event_type = %event.meta.event_type,
                    %err,
                    "message lookup failed during comment update"
                );
                outcome.storage_degraded = true;
                None
            }
        };

        let (conversation_id, sender) = match &stored {
            Some(message) => (message.conversation_id.clone(), message.sender),
            None => (
                event
                    .meta
                    .subject
                    .as_deref()
                    .map(conversation_id_for_ref)
                    .unwrap_or_default(),
                MessageSender::from_visibility(event.current.public),
            ),
        };

        if stored.is_some() {
            if let Err(err) = self.messages.update_content(&id, &content).await {
                error!(
                    event_id = %event.meta.id,
                    event_type = %event.meta.event_type,
                    %err,
                    "message content update failed"
                );
                outcome.storage_degraded = true;
            }
        }

        outcome.events.push(DomainEvent::MessageUpdated(MessagePayload {
            message_id: id,
            conversation_id,
            content,
            sender,
            metadata: json!({ "event_id": event.meta.id }),
        }));

        outcome
    }

    fn apply_unknown(event: &UnknownEvent) -> SyncOutcome {
        let mut outcome = SyncOutcome::default();
        outcome.events.push(DomainEvent::Webhook(WebhookPayload {
            source: "zendesk".into(),
            event_type: event.meta.event_type.clone(),
            payload: event.payload.clone(),
        }));
        outcome
    }

    /// Create the conversation record for a comment whose ticket was
    /// never observed. No `CONVERSATION_CREATED` is emitted on this
    /// path; the record exists so the message has an owner.
    async fn ensure_conversation(
        &self,
        conversation_id: &str,
        ticket_ref: &str,
        meta: &EventMeta,
        outcome: &mut SyncOutcome,
    ) {
        match self.conversations.get_by_id(conversation_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let now = Utc::now();
                let conversation = Conversation {
                    id: conversation_id.to_owned(),
                    ticket_id: ticket_ref.parse().unwrap_or_default(),
                    customer_id: None,
                    agent_id: None,
                    status: ConversationStatus::Open,
                    subject: None,
                    priority: None,
                    tags: Vec::new(),
                    metadata: json!({ "subdomain": meta.subdomain }),
                    created_at: now,
                    updated_at: now,
                };
                self.upsert_conversation(&conversation, meta, outcome).await;
            }
            Err(err) => {
                error!(
                    event_id = %meta.id,
                    event_type = %meta.event_type,
                    %err,
                    "conversation lookup failed"
                );
                outcome.storage_degraded = true;
            }
        }
    }

    async fn upsert_conversation(
        &self,
        conversation: &Conversation,
        meta: &EventMeta,
        outcome: &mut SyncOutcome,
    ) {
        if let Err(err) = self.conversations.upsert(conversation).await {
            error!(
                event_id = %meta.id,
                event_type = %meta.event_type,
                conversation_id = %conversation.id,
                %err,
                "conversation upsert failed; continuing to publish"
            );
            outcome.storage_degraded = true;
        }
    }

    async fn upsert_message(&self, message: &Message, meta: &EventMeta, outcome: &mut SyncOutcome) {
        if let Err(err) = self.messages.upsert(message).await {
            error!(
                event_id = %meta.id,
                event_type = %meta.event_type,
                message_id = %message.id,
                %err,
                "message upsert failed; continuing to publish"
            );
            outcome.storage_degraded = true;
        }
    }
}

/// Map a ticket snapshot onto the normalized conversation record.
fn conversation_from_snapshot(snapshot: &TicketSnapshot, meta: &EventMeta) -> Conversation {
    let now = Utc::now();
    Conversation {
        id: conversation_id(snapshot.id),
        ticket_id: snapshot.id,
        customer_id: snapshot.requester_id,
        agent_id: snapshot.assignee_id,
        status: ConversationStatus::from_external(snapshot.status.as_deref().unwrap_or_default()),
        subject: snapshot.subject.clone(),
        priority: snapshot.priority.clone(),
        tags: snapshot.tags.clone().unwrap_or_default(),
        metadata: json!({ "subdomain": meta.subdomain }),
        created_at: now,
        updated_at: now,
    }
}

fn conversation_payload(
    conversation: &Conversation,
    meta: &EventMeta,
    delta: Option<serde_json::Value>,
) -> ConversationPayload {
    let mut metadata = json!({
        "event_id": meta.id,
        "subdomain": meta.subdomain,
    });
    if let Some(delta) = delta {
        if let Some(map) = metadata.as_object_mut() {
            map.insert("delta".into(), delta);
        }
    }
    ConversationPayload {
        conversation_id: conversation.id.clone(),
        ticket_id: conversation.ticket_id,
        customer_id: conversation.customer_id,
        agent_id: conversation.agent_id,
        status: conversation.status,
        metadata,
    }
}
