use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use crate::config::{default_fetch_rules, default_search_rules, AppConfig};
use crate::data::StatDatabase;
use crate::errors::{Result, TradeError};
use crate::models::{
    FetchResult, ItemFilters, ParsedItem, PriceCheck, PricingOptions, PricingResult, SearchResult,
    StatFilter, TradeRequest,
};
use crate::pricing::normalize_results;
use crate::query::QueryBuilder;
use super::cache::{derive_ttl, Cache};
use super::rate_limiter::{
    adjust_rate_limits, prevent_queue_creation, QueueDemand, RateLimitGroup, RateLimitRule,
    RuleConfig,
};
use super::session::{redact, CredentialProvider};
use super::transport::{HttpMethod, ReqwestTransport, TradeTransport, TransportRequest, TransportResponse};

/// Most ids the trade site accepts in one fetch call.
pub const FETCH_BATCH_SIZE: usize = 10;

/// Budgets for the two trade endpoints.
#[derive(Debug)]
pub struct TradeRateLimits {
    pub search: RateLimitGroup,
    pub fetch: RateLimitGroup,
}

impl TradeRateLimits {
    pub fn new(search: &[RuleConfig], fetch: &[RuleConfig]) -> Self {
        Self {
            search: RateLimitGroup::new("search", search),
            fetch: RateLimitGroup::new("fetch", fetch),
        }
    }

    fn all_rules(&self) -> Vec<Arc<RateLimitRule>> {
        let mut rules = self.search.rules();
        rules.extend(self.fetch.rules());
        rules
    }
}

impl Default for TradeRateLimits {
    fn default() -> Self {
        Self::new(&default_search_rules(), &default_fetch_rules())
    }
}

#[derive(Debug, Deserialize)]
struct FetchResponse {
    #[serde(default)]
    result: Vec<Option<FetchResult>>,
}

/// Client for the trade search and fetch endpoints.
///
/// Every call goes through the endpoint's rate limits and a response cache whose
/// lifetime follows those limits.
pub struct TradeClient {
    transport: Arc<dyn TradeTransport>,
    credentials: Arc<dyn CredentialProvider>,
    stats: Arc<StatDatabase>,
    limits: TradeRateLimits,
    search_cache: Cache<SearchResult>,
    fetch_cache: Cache<Vec<FetchResult>>,
    user_agent: String,
}

impl TradeClient {
    pub fn new(
        transport: Arc<dyn TradeTransport>,
        credentials: Arc<dyn CredentialProvider>,
        stats: Arc<StatDatabase>,
    ) -> Self {
        Self {
            transport,
            credentials,
            stats,
            limits: TradeRateLimits::default(),
            search_cache: Cache::new(),
            fetch_cache: Cache::new(),
            user_agent: AppConfig::default().user_agent,
        }
    }

    pub fn from_config(
        config: &AppConfig,
        credentials: Arc<dyn CredentialProvider>,
        stats: Arc<StatDatabase>,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config.api_base_url)?);
        Ok(Self::new(transport, credentials, stats)
            .with_rate_limits(TradeRateLimits::new(
                &config.rate_limits.search,
                &config.rate_limits.fetch,
            ))
            .with_user_agent(&config.user_agent))
    }

    pub fn with_rate_limits(mut self, limits: TradeRateLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn rate_limits(&self) -> &TradeRateLimits {
        &self.limits
    }

    #[instrument(skip_all, fields(league = %league_id))]
    pub async fn search(&self, request: &TradeRequest, league_id: &str) -> Result<SearchResult> {
        let key = (request, league_id);
        if let Some(cached) = self.search_cache.get(&key) {
            debug!(query_id = %cached.id, "Search served from cache");
            return Ok(cached);
        }

        // A search is always followed by a fetch
        prevent_queue_creation(&[
            QueueDemand::new(1, &self.limits.search),
            QueueDemand::new(1, &self.limits.fetch),
        ])?;
        self.limits.search.acquire().await?;

        let body = serde_json::to_string(request)?;
        let response = self
            .transport
            .send(TransportRequest {
                method: HttpMethod::Post,
                path: format!("/trade/search/{}", league_id),
                headers: self.headers(true),
                body: Some(body),
            })
            .await?;
        adjust_rate_limits(&self.limits.search, &response.headers);

        let result: SearchResult = parse_envelope(&response)?;
        info!(query_id = %result.id, total = result.total, "Search completed");

        self.search_cache.set(&key, result.clone(), self.response_ttl());
        Ok(result)
    }

    #[instrument(skip_all, fields(count = result_ids.len()))]
    pub async fn fetch(&self, result_ids: &[String]) -> Result<Vec<FetchResult>> {
        if result_ids.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(cached) = self.fetch_cache.get(result_ids) {
            debug!("Fetch served from cache");
            return Ok(cached);
        }

        prevent_queue_creation(&[QueueDemand::new(1, &self.limits.fetch)])?;
        self.limits.fetch.acquire().await?;

        let response = self
            .transport
            .send(TransportRequest {
                method: HttpMethod::Get,
                path: format!("/trade/fetch/{}", result_ids.join(",")),
                headers: self.headers(false),
                body: None,
            })
            .await?;
        adjust_rate_limits(&self.limits.fetch, &response.headers);

        let envelope: FetchResponse = parse_envelope(&response)?;
        let requested = envelope.result.len();
        let results: Vec<FetchResult> = envelope.result.into_iter().flatten().collect();
        info!(listings = results.len(), dropped = requested - results.len(), "Fetch completed");

        self.fetch_cache.set(result_ids, results.clone(), self.response_ttl());
        Ok(results)
    }

    /// Fetches the given listings, in batches the trade site accepts, and normalizes them.
    pub async fn request_results(
        &self,
        query_id: &str,
        result_ids: &[String],
        opts: &PricingOptions,
    ) -> Result<Vec<PricingResult>> {
        let mut fetched = Vec::with_capacity(result_ids.len());
        for chunk in result_ids.chunks(FETCH_BATCH_SIZE) {
            fetched.extend(self.fetch(chunk).await?);
        }

        debug!(query_id, listings = fetched.len(), "Normalizing listings");
        Ok(normalize_results(fetched, opts, Utc::now()))
    }

    /// Builds the query, searches and prices the first page of listings.
    pub async fn price_check(
        &self,
        filters: &ItemFilters,
        stats: &[StatFilter],
        item: &ParsedItem,
        league_id: &str,
        opts: &PricingOptions,
    ) -> Result<PriceCheck> {
        let request = QueryBuilder::new(&self.stats).build(filters, stats, item)?;
        let search = self.search(&request, league_id).await?;

        let mut opts = opts.clone();
        if opts.divine_exalt_ratio.is_none() {
            opts.divine_exalt_ratio = search.ratio;
        }

        let first_page = &search.result[..search.result.len().min(FETCH_BATCH_SIZE)];
        let listings = self.request_results(&search.id, first_page, &opts).await?;

        Ok(PriceCheck {
            id: search.id,
            total: search.total,
            inexact: search.inexact.unwrap_or(false),
            result_ids: search.result,
            listings,
        })
    }

    fn response_ttl(&self) -> Duration {
        derive_ttl(&self.limits.all_rules())
    }

    fn headers(&self, json_body: bool) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_string(), self.user_agent.clone())];
        if json_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.credentials.session_token() {
            debug!(session = %redact(&token), "Attaching session cookie");
            headers.push(("Cookie".to_string(), format!("POESESSID={}", token)));
        }
        headers
    }
}

/// Trade responses carry either the payload or `{"error": {"message": ...}}`.
fn parse_envelope<T: DeserializeOwned>(response: &TransportResponse) -> Result<T> {
    let value: serde_json::Value = match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) if !response.is_success() => {
            return Err(TradeError::NetworkError(format!("HTTP {}", response.status)));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("Unknown trade API error")
            .to_string();
        warn!(status = response.status, %message, "Trade API returned an error");
        return Err(TradeError::ApiError(message));
    }

    if !response.is_success() {
        return Err(TradeError::NetworkError(format!("HTTP {}", response.status)));
    }

    serde_json::from_value(value)
        .map_err(|e| TradeError::ParseError(format!("Failed to parse trade response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::session::SessionStore;
    use crate::models::{ItemCategory, ItemRarity, RarityFilter, SearchTarget, StatRoll, TradeStatus};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::header::{HeaderMap, HeaderValue};
    use serde_json::{json, Value};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct FakeTransport {
        requests: Mutex<Vec<TransportRequest>>,
        responses: Mutex<VecDeque<TransportResponse>>,
    }

    impl FakeTransport {
        fn respond(&self, status: u16, body: Value) {
            self.respond_with_headers(status, body, HeaderMap::new());
        }

        fn respond_with_headers(&self, status: u16, body: Value, headers: HeaderMap) {
            self.responses.lock().push_back(TransportResponse {
                status,
                headers,
                body: body.to_string(),
            });
        }

        fn requests(&self) -> Vec<TransportRequest> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl TradeTransport for FakeTransport {
        async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
            self.requests.lock().push(request);
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| TradeError::NetworkError("no response queued".to_string()))
        }
    }

    fn client(transport: Arc<FakeTransport>, session: Option<&str>) -> TradeClient {
        let credentials = match session {
            Some(token) => SessionStore::with_token(token),
            None => SessionStore::new(),
        };
        TradeClient::new(
            transport,
            Arc::new(credentials),
            Arc::new(StatDatabase::embedded().unwrap()),
        )
        .with_user_agent("test-agent")
    }

    fn request() -> TradeRequest {
        TradeRequest {
            query: crate::models::TradeQuery::new(TradeStatus::Online),
            sort: Default::default(),
        }
    }

    fn ids(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("id{}", i)).collect()
    }

    fn listing(id: &str, amount: f64, currency: &str) -> Value {
        json!({
            "id": id,
            "item": { "ilvl": 80 },
            "listing": {
                "indexed": "2024-12-20T10:00:00Z",
                "price": { "amount": amount, "currency": currency },
                "account": { "name": "Seller#1", "lastCharacterName": "Char" }
            }
        })
    }

    fn header(name: &'static str, value: &str) -> (reqwest::header::HeaderName, HeaderValue) {
        (
            reqwest::header::HeaderName::from_static(name),
            HeaderValue::from_str(value).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_search_sends_request_and_caches() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(200, json!({ "id": "Q1", "result": ["a", "b"], "total": 2 }));
        let client = client(transport.clone(), Some("abcdef123456"));

        let first = client.search(&request(), "Standard").await.unwrap();
        let used = client.rate_limits().search.rules()[0].snapshot().used;
        assert_eq!(used, 1);

        let second = client.search(&request(), "Standard").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(client.rate_limits().search.rules()[0].snapshot().used, used);
        assert_eq!(first.get_result_ids().len(), 2);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[0].path, "/trade/search/Standard");
        assert!(sent[0].headers.contains(&("User-Agent".to_string(), "test-agent".to_string())));
        assert!(sent[0].headers.contains(&("Content-Type".to_string(), "application/json".to_string())));
        assert!(sent[0].headers.contains(&("Cookie".to_string(), "POESESSID=abcdef123456".to_string())));

        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["sort"], json!({ "price": "asc" }));
    }

    #[tokio::test]
    async fn test_search_cache_is_per_league() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(200, json!({ "id": "Q1", "result": [], "total": 0 }));
        transport.respond(200, json!({ "id": "Q2", "result": [], "total": 0 }));
        let client = client(transport.clone(), None);

        client.search(&request(), "Standard").await.unwrap();
        let other = client.search(&request(), "Hardcore").await.unwrap();
        assert_eq!(other.id, "Q2");
        assert_eq!(transport.requests().len(), 2);
        assert!(transport.requests()[0].headers.iter().all(|(name, _)| name != "Cookie"));
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced_verbatim() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(400, json!({ "error": { "code": 2, "message": "Invalid query" } }));
        let client = client(transport, None);

        let err = client.search(&request(), "Standard").await.unwrap_err();
        assert!(matches!(err, TradeError::ApiError(ref message) if message == "Invalid query"));
        assert_eq!(err.to_string(), "Invalid query");
    }

    #[tokio::test]
    async fn test_non_json_failure_is_network_error() {
        let transport = Arc::new(FakeTransport::default());
        transport.responses.lock().push_back(TransportResponse {
            status: 503,
            headers: HeaderMap::new(),
            body: "<html>maintenance</html>".to_string(),
        });
        let client = client(transport, None);

        let err = client.fetch(&ids(0..1)).await.unwrap_err();
        assert!(matches!(err, TradeError::NetworkError(_)));
    }

    #[tokio::test]
    async fn test_guard_rejects_without_network_call() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(transport.clone(), None).with_rate_limits(TradeRateLimits::new(
            &[RuleConfig::new(5, 10)],
            &[RuleConfig::new(0, 4)],
        ));

        let err = client.search(&request(), "Standard").await.unwrap_err();
        assert!(matches!(err, TradeError::RateLimitError { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_with_closed_window_fails_fast() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(transport.clone(), None).with_rate_limits(TradeRateLimits::new(
            &[RuleConfig::new(5, 10)],
            &[RuleConfig::new(0, 4)],
        ));

        let outcome = tokio::time::timeout(
            Duration::from_secs(24 * 60 * 60),
            client.fetch(&ids(0..1)),
        )
        .await
        .expect("fetch never returned");

        assert!(matches!(outcome, Err(TradeError::RateLimitError { .. })));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_response_headers_adjust_limits() {
        let transport = Arc::new(FakeTransport::default());
        let headers: HeaderMap = [
            header("x-rate-limit-rules", "Ip"),
            header("x-rate-limit-ip", "7:10:60,20:60:120"),
            header("x-rate-limit-ip-state", "2:10:0,2:60:0"),
        ]
        .into_iter()
        .collect();
        transport.respond_with_headers(200, json!({ "id": "Q1", "result": [], "total": 0 }), headers);
        let client = client(transport, None);

        client.search(&request(), "Standard").await.unwrap();

        let rules = client.rate_limits().search.rules();
        assert_eq!(rules.len(), 2);
        let snapshot = rules[0].snapshot();
        assert_eq!((snapshot.capacity, snapshot.used), (7, 2));
        assert_eq!(client.rate_limits().fetch.rules().len(), 2);
    }

    #[tokio::test]
    async fn test_error_response_still_adjusts_limits() {
        let transport = Arc::new(FakeTransport::default());
        let headers: HeaderMap = [
            header("x-rate-limit-rules", "Ip"),
            header("x-rate-limit-ip", "12:4:60"),
            header("x-rate-limit-ip-state", "13:4:60"),
        ]
        .into_iter()
        .collect();
        transport.respond_with_headers(
            429,
            json!({ "error": { "code": 3, "message": "Rate limit exceeded" } }),
            headers,
        );
        let client = client(transport, None);

        assert!(client.fetch(&ids(0..1)).await.is_err());
        assert!(client.rate_limits().fetch.rules()[0].snapshot().restricted_for.is_some());
    }

    #[tokio::test]
    async fn test_fetch_drops_missing_listings_and_caches() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(
            200,
            json!({ "result": [listing("id0", 1.0, "divine"), null, listing("id2", 2.0, "divine")] }),
        );
        let client = client(transport.clone(), None);

        let results = client.fetch(&ids(0..3)).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].id, "id2");

        let again = client.fetch(&ids(0..3)).await.unwrap();
        assert_eq!(again, results);

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].method, HttpMethod::Get);
        assert_eq!(sent[0].path, "/trade/fetch/id0,id1,id2");
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(transport.clone(), None);
        assert!(client.fetch(&[]).await.unwrap().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_request_results_batches_and_sorts() {
        let transport = Arc::new(FakeTransport::default());
        for batch in [0..10, 10..20, 20..25] {
            let listings: Vec<Value> = batch
                .map(|i| listing(&format!("id{}", i), 30.0 - i as f64, "divine"))
                .collect();
            transport.respond(200, json!({ "result": listings }));
        }
        let client = client(transport.clone(), None);

        let rows = client
            .request_results("Q1", &ids(0..25), &PricingOptions::default())
            .await
            .unwrap();

        assert_eq!(transport.requests().len(), 3);
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[0].id, "id24");
        assert_eq!(rows[24].id, "id0");
    }

    #[tokio::test]
    async fn test_price_check_end_to_end() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(
            200,
            json!({ "id": "Q1", "result": ids(0..12), "total": 12, "inexact": true, "ratio": 100.0 }),
        );
        let page: Vec<Value> = (0..10)
            .map(|i| {
                if i == 3 {
                    listing("id3", 50.0, "exalted")
                } else {
                    listing(&format!("id{}", i), 1.0 + i as f64, "divine")
                }
            })
            .collect();
        transport.respond(200, json!({ "result": page }));
        let client = client(transport.clone(), None);

        let filters = ItemFilters {
            search_exact: SearchTarget {
                category: Some(ItemCategory::Ring),
                ..Default::default()
            },
            rarity: Some(RarityFilter { value: "rare".to_string() }),
            ..Default::default()
        };
        let stats = vec![
            StatFilter::new("+# to maximum Life", &["explicit.stat_3299347043"])
                .with_roll(StatRoll::at_least(50.0)),
        ];
        let item = ParsedItem::new(ItemCategory::Ring, ItemRarity::Rare);

        let check = client
            .price_check(&filters, &stats, &item, "Standard", &PricingOptions::default())
            .await
            .unwrap();

        assert_eq!(check.id, "Q1");
        assert_eq!(check.total, 12);
        assert!(check.inexact);
        assert_eq!(check.result_ids.len(), 12);
        assert_eq!(check.listings.len(), 10);
        assert_eq!(check.listings[0].id, "id3");
        assert_eq!(check.listings[0].display_price, "0.50 divine (50 exalted)");

        let sent = transport.requests();
        assert_eq!(sent[1].path, format!("/trade/fetch/{}", ids(0..10).join(",")));

        let body: Value = serde_json::from_str(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["query"]["filters"]["type_filters"]["filters"]["category"]["option"], "accessory.ring");
    }

    #[tokio::test]
    async fn test_price_check_rejects_unmapped_category() {
        let transport = Arc::new(FakeTransport::default());
        let client = client(transport.clone(), None);
        let filters = ItemFilters {
            search_exact: SearchTarget {
                category: Some(ItemCategory::Waystone),
                ..Default::default()
            },
            ..Default::default()
        };
        let item = ParsedItem::new(ItemCategory::Waystone, ItemRarity::Normal);

        let result = client
            .price_check(&filters, &[], &item, "Standard", &PricingOptions::default())
            .await;
        assert!(matches!(result, Err(TradeError::InvalidCategory(_))));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_search_expires_with_rate_limit_window() {
        let transport = Arc::new(FakeTransport::default());
        transport.respond(200, json!({ "id": "Q1", "result": [], "total": 0 }));
        transport.respond(200, json!({ "id": "Q2", "result": [], "total": 0 }));
        let client = client(transport.clone(), None);

        client.search(&request(), "Standard").await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(client.search(&request(), "Standard").await.unwrap().id, "Q1");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(client.search(&request(), "Standard").await.unwrap().id, "Q2");
    }
}
