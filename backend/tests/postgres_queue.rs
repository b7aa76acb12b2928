//! Durable queue semantics against an embedded PostgreSQL cluster.
//!
//! Run with `RUN_PG_EMBEDDED=1 cargo test --test postgres_queue -- --ignored`.

use std::time::Duration;

use backend::domain::ports::{MessagePublisher, MessageQueueError, MessageSubscriber};
use backend::outbound::queue::{PostgresMessageQueue, PostgresQueueConfig};
use pg_embedded_setup_unpriv::TestCluster;
use rstest::{fixture, rstest};
use sqlx::postgres::PgPoolOptions;
use tokio::runtime::{Builder, Runtime};

mod support;

use support::{handle_cluster_setup_failure, should_run_embedded_cluster, test_cluster};

const QUEUE: &str = "sighting_notifications";
const POLL: Duration = Duration::from_millis(10);

struct QueueContext {
    queue: PostgresMessageQueue,
    database_url: String,
    runtime: Runtime,
    _cluster: TestCluster,
}

impl QueueContext {
    /// Run `test` against the queue, then close it on the same runtime.
    fn run<F, Fut>(self, test: F)
    where
        F: FnOnce(PostgresMessageQueue, String) -> Fut,
        Fut: Future<Output = PostgresMessageQueue>,
    {
        let Self {
            queue,
            database_url,
            runtime,
            _cluster,
        } = self;
        runtime.block_on(async move {
            let queue = test(queue, database_url).await;
            queue.close().await.expect("close queue");
        });
    }
}

fn setup_context() -> Result<QueueContext, String> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let database_url = cluster.connection().database_url("postgres");
    let config = PostgresQueueConfig::new(database_url.clone(), QUEUE).with_poll_interval(POLL);
    let queue = runtime
        .block_on(PostgresMessageQueue::connect(config))
        .map_err(|err| err.to_string())?;

    Ok(QueueContext {
        queue,
        database_url,
        runtime,
        _cluster: cluster,
    })
}

#[fixture]
fn queue_context() -> Option<QueueContext> {
    if !should_run_embedded_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: set RUN_PG_EMBEDDED=1 to run");
        return None;
    }
    match setup_context() {
        Ok(context) => Some(context),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

async fn row_count(database_url: &str, queue_name: &str) -> i64 {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await
        .expect("inspection pool");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM queue_messages WHERE queue_name = $1")
        .bind(queue_name)
        .fetch_one(&pool)
        .await
        .expect("count rows");
    pool.close().await;
    count
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn receives_in_publish_order(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, _| async move {
        for payload in [b"a", b"b", b"c"] {
            queue.publish(payload).await.expect("publish");
        }

        let mut received = Vec::new();
        for _ in 0..3 {
            let delivery = queue.receive().await.expect("receive");
            assert_eq!(delivery.delivery_count, 1);
            received.push(delivery.payload);
            queue.ack(delivery.tag).await.expect("ack");
        }

        assert_eq!(received, [b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn requeue_moves_message_behind_waiting_ones(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, _| async move {
        queue.publish(b"a").await.expect("publish");
        queue.publish(b"b").await.expect("publish");

        let first = queue.receive().await.expect("receive a");
        queue.nack(first.tag, true).await.expect("requeue a");
        let second = queue.receive().await.expect("receive b");
        let third = queue.receive().await.expect("receive a again");

        assert_eq!(second.payload, b"b");
        assert_eq!(second.delivery_count, 1);
        assert_eq!(third.payload, b"a");
        assert_eq!(third.delivery_count, 2);
        queue.ack(second.tag).await.expect("ack b");
        queue.ack(third.tag).await.expect("ack a");
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn settled_messages_are_deleted(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, database_url| async move {
        queue.publish(b"acked").await.expect("publish");
        queue.publish(b"dropped").await.expect("publish");

        let acked = queue.receive().await.expect("receive");
        queue.ack(acked.tag).await.expect("ack");
        let dropped = queue.receive().await.expect("receive");
        queue.nack(dropped.tag, false).await.expect("discard");

        assert_eq!(row_count(&database_url, QUEUE).await, 0);
        assert_eq!(
            queue.ack(acked.tag).await,
            Err(MessageQueueError::unknown_delivery(acked.tag.get()))
        );
        assert_eq!(
            queue.nack(dropped.tag, true).await,
            Err(MessageQueueError::unknown_delivery(dropped.tag.get()))
        );
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn restart_releases_unsettled_claims(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, database_url| async move {
        queue.publish(b"orphaned").await.expect("publish");
        let claimed = queue.receive().await.expect("receive");
        assert_eq!(claimed.delivery_count, 1);

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("second pool");
        let restarted = PostgresMessageQueue::with_pool(pool, QUEUE, POLL);
        let released = restarted.prepare().await.expect("prepare");
        let redelivered = restarted.receive().await.expect("redelivery");

        assert_eq!(released, 1);
        assert_eq!(redelivered.payload, b"orphaned");
        assert_eq!(redelivered.delivery_count, 2);
        restarted.ack(redelivered.tag).await.expect("ack");
        restarted.close().await.expect("close restarted queue");
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn queue_names_do_not_share_messages(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, database_url| async move {
        let other_config =
            PostgresQueueConfig::new(database_url.as_str(), "audit_log").with_poll_interval(POLL);
        let other = PostgresMessageQueue::connect(other_config)
            .await
            .expect("connect other queue");
        other.publish(b"audit").await.expect("publish audit");
        queue.publish(b"sighting").await.expect("publish sighting");

        let delivery = queue.receive().await.expect("receive");

        assert_eq!(delivery.payload, b"sighting");
        assert_eq!(row_count(&database_url, "audit_log").await, 1);
        queue.ack(delivery.tag).await.expect("ack");
        other.close().await.expect("close other queue");
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn receive_waits_for_publish(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, _| async move {
        let (delivery, published) = tokio::join!(queue.receive(), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            queue.publish(b"late").await
        });

        published.expect("publish");
        let delivery = delivery.expect("receive");
        assert_eq!(delivery.payload, b"late");
        queue.ack(delivery.tag).await.expect("ack");
        queue
    });
}

#[rstest]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn closed_queue_rejects_further_use(queue_context: Option<QueueContext>) {
    let Some(context) = queue_context else {
        return;
    };

    context.run(|queue, _| async move {
        queue.close().await.expect("close");

        assert_eq!(queue.receive().await, Err(MessageQueueError::closed()));
        assert_eq!(queue.publish(b"late").await, Err(MessageQueueError::closed()));
        queue
    });
}
