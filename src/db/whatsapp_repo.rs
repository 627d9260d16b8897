// src/db/whatsapp_repo.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Executor};

use crate::{
    common::error::AppError,
    models::whatsapp::{
        Conversation, InboundMessage, MessageFilter, MessageStatusUpdate, NewInboundMessage,
        NewStatusUpdate,
    },
};

/// Persistência de mensagens, status de entrega e conversas do WhatsApp.
#[async_trait]
pub trait WhatsAppStore: Send + Sync {
    /// Grava a mensagem e atualiza a conversa do remetente na mesma transação.
    /// Retorna `None` quando o `message_id` já existe (duplicata).
    async fn record_message(
        &self,
        message: &NewInboundMessage,
    ) -> Result<Option<InboundMessage>, AppError>;

    async fn record_status(&self, status: &NewStatusUpdate) -> Result<MessageStatusUpdate, AppError>;

    async fn attach_media_url(&self, message_id: &str, media_url: &str) -> Result<(), AppError>;

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<InboundMessage>, AppError>;

    async fn list_conversations(&self, limit: i64) -> Result<Vec<Conversation>, AppError>;

    async fn latest_messages(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<InboundMessage>, AppError>;

    /// Zera `unread_count` e passa as mensagens `received` do número para `read`.
    /// `None` se não existe conversa para o número.
    async fn mark_conversation_read(&self, phone_number: &str) -> Result<Option<u64>, AppError>;
}

#[derive(Clone)]
pub struct WhatsAppRepository {
    pool: PgPool,
}

impl WhatsAppRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_conversation<'e, E>(
        &self,
        executor: E,
        message: &InboundMessage,
    ) -> Result<Conversation, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Cria com contadores em 1 ou incrementa; o nome só é preenchido se ainda não houver
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO whatsapp_conversations (
                phone_number, contact_name, last_message_at, message_count, unread_count
            )
            VALUES ($1, $2, $3, 1, 1)
            ON CONFLICT (phone_number) DO UPDATE SET
                last_message_at = EXCLUDED.last_message_at,
                message_count   = whatsapp_conversations.message_count + 1,
                unread_count    = whatsapp_conversations.unread_count + 1,
                contact_name    = COALESCE(whatsapp_conversations.contact_name, EXCLUDED.contact_name),
                updated_at      = NOW()
            RETURNING *
            "#,
        )
        .bind(&message.from_number)
        .bind(&message.from_name)
        .bind(message.timestamp)
        .fetch_one(executor)
        .await?;

        Ok(conversation)
    }
}

#[async_trait]
impl WhatsAppStore for WhatsAppRepository {
    async fn record_message(
        &self,
        message: &NewInboundMessage,
    ) -> Result<Option<InboundMessage>, AppError> {
        let mut tx = self.pool.begin().await?;
        let cols = message.content.columns();

        // O UNIQUE(message_id) é quem decide se é duplicata, sem corrida entre entregas concorrentes
        let inserted = sqlx::query_as::<_, InboundMessage>(
            r#"
            INSERT INTO whatsapp_messages (
                message_id, wamid, from_number, from_name, message_type,
                text_body, media_id, media_mime_type, media_caption,
                latitude, longitude, location_name, location_address,
                timestamp, context_message_id, raw_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&message.message_id)
        .bind(&message.wamid)
        .bind(&message.from_number)
        .bind(&message.from_name)
        .bind(message.content.message_type())
        .bind(cols.text_body)
        .bind(cols.media_id)
        .bind(cols.media_mime_type)
        .bind(cols.media_caption)
        .bind(cols.latitude)
        .bind(cols.longitude)
        .bind(cols.location_name)
        .bind(cols.location_address)
        .bind(message.timestamp)
        .bind(&message.context_message_id)
        .bind(&message.raw_payload)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(stored) = inserted else {
            tx.rollback().await?;
            return Ok(None);
        };

        self.upsert_conversation(&mut *tx, &stored).await?;
        tx.commit().await?;

        Ok(Some(stored))
    }

    async fn record_status(&self, status: &NewStatusUpdate) -> Result<MessageStatusUpdate, AppError> {
        let row = sqlx::query_as::<_, MessageStatusUpdate>(
            r#"
            INSERT INTO whatsapp_message_statuses (
                message_id, recipient_number, status, timestamp,
                error_code, error_message, raw_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&status.message_id)
        .bind(&status.recipient_number)
        .bind(status.status)
        .bind(status.timestamp)
        .bind(&status.error_code)
        .bind(&status.error_message)
        .bind(&status.raw_payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn attach_media_url(&self, message_id: &str, media_url: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE whatsapp_messages SET media_url = $2 WHERE message_id = $1")
            .bind(message_id)
            .bind(media_url)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<InboundMessage>, AppError> {
        let messages = sqlx::query_as::<_, InboundMessage>(
            r#"
            SELECT * FROM whatsapp_messages
            WHERE ($1::text IS NULL OR from_number = $1)
              AND ($2::whatsapp_message_type IS NULL OR message_type = $2)
            ORDER BY timestamp DESC
            LIMIT $3
            "#,
        )
        .bind(&filter.phone)
        .bind(filter.message_type)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn list_conversations(&self, limit: i64) -> Result<Vec<Conversation>, AppError> {
        let conversations = sqlx::query_as::<_, Conversation>(
            "SELECT * FROM whatsapp_conversations ORDER BY last_message_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(conversations)
    }

    async fn latest_messages(
        &self,
        phone_number: &str,
        limit: i64,
    ) -> Result<Vec<InboundMessage>, AppError> {
        let messages = sqlx::query_as::<_, InboundMessage>(
            r#"
            SELECT * FROM whatsapp_messages
            WHERE from_number = $1
            ORDER BY timestamp DESC
            LIMIT $2
            "#,
        )
        .bind(phone_number)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn mark_conversation_read(&self, phone_number: &str) -> Result<Option<u64>, AppError> {
        let mut tx = self.pool.begin().await?;

        let reset = sqlx::query(
            "UPDATE whatsapp_conversations SET unread_count = 0, updated_at = NOW() WHERE phone_number = $1",
        )
        .bind(phone_number)
        .execute(&mut *tx)
        .await?;

        if reset.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        let updated = sqlx::query(
            r#"
            UPDATE whatsapp_messages SET status = 'read'
            WHERE from_number = $1 AND status = 'received'
            "#,
        )
        .bind(phone_number)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(updated.rows_affected()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        webhook::{parse_message, parse_status},
        whatsapp::{DeliveryStatus, MessageStatus, MessageType},
    };
    use serde_json::{json, Value};

    const PHONE: &str = "919876543210";

    fn text(id: &str, ts: i64, contacts: &[Value]) -> NewInboundMessage {
        let raw = json!({
            "id": id, "from": PHONE, "timestamp": ts.to_string(),
            "type": "text", "text": { "body": "hello" }
        });
        parse_message(&raw, contacts).unwrap()
    }

    fn named(name: &str) -> Vec<Value> {
        vec![json!({ "wa_id": PHONE, "profile": { "name": name } })]
    }

    fn all_messages() -> MessageFilter {
        MessageFilter { phone: None, message_type: None, limit: 100 }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_message_id_is_ignored(pool: PgPool) {
        let repo = WhatsAppRepository::new(pool);
        let message = text("wamid.1", 1_700_000_000, &[]);

        let first = repo.record_message(&message).await.unwrap();
        let second = repo.record_message(&message).await.unwrap();

        assert_eq!(first.unwrap().message_id, "wamid.1");
        assert!(second.is_none());
        assert_eq!(repo.list_messages(&all_messages()).await.unwrap().len(), 1);

        let conversations = repo.list_conversations(50).await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].message_count, 1);
        assert_eq!(conversations[0].unread_count, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn display_name_is_only_backfilled_when_missing(pool: PgPool) {
        let repo = WhatsAppRepository::new(pool);

        repo.record_message(&text("wamid.a", 1_700_000_000, &[])).await.unwrap();
        repo.record_message(&text("wamid.b", 1_700_000_001, &named("Priya"))).await.unwrap();
        repo.record_message(&text("wamid.c", 1_700_000_002, &named("P. Sharma"))).await.unwrap();

        let conversation = repo.list_conversations(50).await.unwrap().remove(0);
        assert_eq!(conversation.contact_name.as_deref(), Some("Priya"));
        assert_eq!(conversation.message_count, 3);
        assert_eq!(conversation.last_message_at.timestamp(), 1_700_000_002);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn filters_by_phone_and_type(pool: PgPool) {
        let repo = WhatsAppRepository::new(pool);
        let location = parse_message(
            &json!({
                "id": "wamid.loc", "from": PHONE, "timestamp": "1700000100",
                "type": "location", "location": { "latitude": 12.97, "longitude": 77.59 }
            }),
            &[],
        )
        .unwrap();
        repo.record_message(&text("wamid.t", 1_700_000_000, &[])).await.unwrap();
        repo.record_message(&location).await.unwrap();

        let only_locations = repo
            .list_messages(&MessageFilter {
                phone: Some(PHONE.to_string()),
                message_type: Some(MessageType::Location),
                limit: 100,
            })
            .await
            .unwrap();
        assert_eq!(only_locations.len(), 1);
        assert_eq!(only_locations[0].latitude, Some(12.97));
        assert!(only_locations[0].text_body.is_none());

        let newest = repo
            .list_messages(&MessageFilter { limit: 1, ..all_messages() })
            .await
            .unwrap();
        assert_eq!(newest[0].message_id, "wamid.loc");

        let other_phone = repo
            .list_messages(&MessageFilter { phone: Some("910000000000".into()), ..all_messages() })
            .await
            .unwrap();
        assert!(other_phone.is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn mark_read_resets_conversation_and_messages(pool: PgPool) {
        let repo = WhatsAppRepository::new(pool);
        repo.record_message(&text("wamid.1", 1_700_000_000, &[])).await.unwrap();
        repo.record_message(&text("wamid.2", 1_700_000_001, &[])).await.unwrap();

        assert_eq!(repo.mark_conversation_read("910000000000").await.unwrap(), None);
        assert_eq!(repo.mark_conversation_read(PHONE).await.unwrap(), Some(2));

        let conversation = repo.list_conversations(50).await.unwrap().remove(0);
        assert_eq!(conversation.unread_count, 0);
        assert_eq!(conversation.message_count, 2);
        assert!(repo
            .latest_messages(PHONE, 10)
            .await
            .unwrap()
            .iter()
            .all(|m| m.status == MessageStatus::Read));

        // Nada mais em `received`
        assert_eq!(repo.mark_conversation_read(PHONE).await.unwrap(), Some(0));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn statuses_are_appended_and_media_url_attached(pool: PgPool) {
        let repo = WhatsAppRepository::new(pool.clone());
        let status = parse_status(&json!({
            "id": "wamid.OUT", "recipient_id": PHONE, "status": "failed",
            "timestamp": "1700000050",
            "errors": [{ "code": 131047, "title": "Re-engagement message" }]
        }))
        .unwrap();

        let saved = repo.record_status(&status).await.unwrap();
        repo.record_status(&status).await.unwrap();

        assert_eq!(saved.status, DeliveryStatus::Failed);
        assert_eq!(saved.error_code.as_deref(), Some("131047"));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM whatsapp_message_statuses")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 2);

        let image = parse_message(
            &json!({
                "id": "wamid.img", "from": PHONE, "timestamp": "1700000000",
                "type": "image", "image": { "id": "media-1" }
            }),
            &[],
        )
        .unwrap();
        repo.record_message(&image).await.unwrap();
        repo.attach_media_url("wamid.img", "https://cdn.example/m1").await.unwrap();

        let stored = repo.latest_messages(PHONE, 1).await.unwrap().remove(0);
        assert_eq!(stored.message_type, MessageType::Image);
        assert_eq!(stored.media_url.as_deref(), Some("https://cdn.example/m1"));
    }
}
