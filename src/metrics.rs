use std::sync::LazyLock;

use log::error;
use prometheus::*;
use tokio::task::spawn_blocking;

static METRIC_EMBED_COUNT: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        "semanticon_embed_count",
        "count of the embedding requests",
        &["modality"]
    )
    .unwrap()
});

static METRIC_EMBED_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        "semanticon_embed_duration",
        "duration of the per-request embedding in seconds",
        &["modality"]
    )
    .unwrap()
});

static METRIC_SEARCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!("semanticon_search_duration", "duration of the vector search in seconds")
        .unwrap()
});

static METRIC_SEARCH_RESULT_COUNT: LazyLock<Histogram> = LazyLock::new(|| {
    register_histogram!(
        "semanticon_search_result_count",
        "number of documents returned by the vector search",
        vec![0., 5., 10., 20., 50., 100.]
    )
    .unwrap()
});

static METRIC_INSERTED_COUNT: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter!("semanticon_inserted_count", "count of the inserted documents").unwrap()
});

pub fn observe_embed(modality: &str, duration: f64) {
    METRIC_EMBED_COUNT.with_label_values(&[modality]).inc();
    METRIC_EMBED_DURATION.with_label_values(&[modality]).observe(duration);
}

pub fn observe_search(duration: f64, count: usize) {
    METRIC_SEARCH_DURATION.observe(duration);
    METRIC_SEARCH_RESULT_COUNT.observe(count as f64);
}

pub fn inc_inserted(count: usize) {
    METRIC_INSERTED_COUNT.inc_by(count as u64);
}

/// 推送指标到 pushgateway，失败时只记录日志
pub async fn push(url: String, instance: String) {
    let metric_families = prometheus::gather();
    let r = spawn_blocking(move || {
        prometheus::push_metrics(
            "semanticon",
            labels! {
                "instance".to_string() => instance,
            },
            &url,
            metric_families,
            None,
        )
    })
    .await;
    match r {
        Ok(Err(e)) => error!("推送指标失败: {e}"),
        Err(e) => error!("推送指标失败: {e}"),
        Ok(Ok(())) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_counter_accumulates() {
        let before = METRIC_INSERTED_COUNT.get();
        inc_inserted(1000);
        inc_inserted(500);
        assert!(METRIC_INSERTED_COUNT.get() >= before + 1500);
    }
}
