use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{instrument, Level};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::MenuSource;
use crate::format::{render_page, FAILURE_MESSAGE};
use crate::reply::ReplySink;
use crate::trigger::{MenuRequest, TriggerSet};

/// The meal-plan command: immutable triggers and config, one fetch per triggered message.
#[derive(Debug)]
pub struct MensaBot<S> {
    triggers: TriggerSet,
    config: Config,
    source: S,
}

impl<S: MenuSource> MensaBot<S> {
    pub fn new(config: Config, source: S) -> Result<Self> {
        let triggers = TriggerSet::new(config.triggers.iter().cloned())?;
        // surface a bad page url at startup instead of on the first message
        config.page_url(Default::default(), Default::default())?;
        log::info!("listening for {:?}", triggers.fragments());
        Ok(Self {
            triggers,
            config,
            source,
        })
    }

    pub fn hears(&self, message: &str) -> bool {
        self.triggers.matches(message)
    }

    /// Fetches, renders and replies once. A failed fetch is answered with the
    /// fixed failure message and then the error detail, as two replies.
    #[instrument(skip_all, level = Level::DEBUG)]
    pub async fn respond<R: ReplySink + ?Sized>(&self, message: &str, sink: &R) {
        let request = MenuRequest::from_message(message);
        log::debug!("handling {request:?}");
        let page = match self
            .config
            .page_url(request.building, request.display_type)
        {
            Ok(url) => self.source.fetch(&url).await,
            Err(e) => Err(e),
        };
        match page {
            Ok(page) => {
                let menu = render_page(&page, &request, &self.config);
                reply(sink, menu).await;
            }
            Err(e) => {
                log::warn!("could not fetch meal plan: {e}");
                reply(sink, FAILURE_MESSAGE.to_owned()).await;
                reply(sink, e.to_string()).await;
            }
        }
    }
}

async fn reply<R: ReplySink + ?Sized>(sink: &R, text: String) {
    if let Err(e) = sink.send(text).await {
        log::warn!("Error while sending reply: {e}");
    }
}

/// Spawns one response task if the message triggers the bot.
pub fn dispatch<S, R>(bot: &Arc<MensaBot<S>>, message: String, sink: &Arc<R>) -> Option<JoinHandle<()>>
where
    S: MenuSource + 'static,
    R: ReplySink + 'static,
{
    if !bot.hears(&message) {
        return None;
    }
    let bot = Arc::clone(bot);
    let sink = Arc::clone(sink);
    Some(tokio::spawn(async move {
        bot.respond(&message, sink.as_ref()).await;
    }))
}

/// Treats every input line as one chat message until EOF or `shutdown`,
/// then waits for the replies still in flight.
pub async fn serve<I, S, R, F>(mut input: I, bot: &Arc<MensaBot<S>>, sink: &Arc<R>, shutdown: F)
where
    I: AsyncBufRead + Unpin,
    S: MenuSource + 'static,
    R: ReplySink + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut line = Vec::new();
    let mut pending = Vec::new();
    loop {
        line.clear();
        tokio::select! {
            read = input.read_until(b'\n', &mut line) => {
                match read {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(e) => {
                        log::error!("could not read message: {e}");
                        break;
                    }
                }
                // invalid UTF-8 is replaced, the rest of the message can still trigger
                let message = String::from_utf8_lossy(&line)
                    .trim_end_matches(['\n', '\r'])
                    .to_owned();
                reap_finished(&mut pending).await;
                if let Some(handle) = dispatch(bot, message, sink) {
                    pending.push(handle);
                }
            }
            () = &mut shutdown => {
                log::info!("interrupted, waiting for {} pending replies", pending.len());
                break;
            }
        }
    }
    join_logged(pending).await;
}

/// Joins the tasks that already finished and keeps the rest.
async fn reap_finished(pending: &mut Vec<JoinHandle<()>>) {
    let (finished, running): (Vec<_>, Vec<_>) = pending.drain(..).partition(JoinHandle::is_finished);
    *pending = running;
    join_logged(finished).await;
}

async fn join_logged(handles: Vec<JoinHandle<()>>) {
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            log::warn!("reply task failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use url::Url;

    use super::*;
    use crate::error::Error;
    use crate::fetch::{make_client, HttpSource};

    #[derive(Debug, Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        fn replies(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplySink for Recorder {
        async fn send(&self, text: String) -> Result<()> {
            self.0.lock().unwrap().push(text);
            Ok(())
        }
    }

    enum Canned {
        Page(&'static str),
        Status(StatusCode),
    }

    struct CannedSource {
        canned: Canned,
        calls: AtomicUsize,
        urls: Mutex<Vec<Url>>,
    }

    impl CannedSource {
        fn new(canned: Canned) -> Self {
            Self {
                canned,
                calls: AtomicUsize::new(0),
                urls: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl MenuSource for CannedSource {
        async fn fetch(&self, url: &Url) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.clone());
            match self.canned {
                Canned::Page(page) => Ok(page.to_owned()),
                Canned::Status(status) => Err(Error::Status(status)),
            }
        }
    }

    const PAGE: &str = r#"<html><body>
<div class="counter_box">
<div class="counter_name">Ausgabe 1</div>
<div class="menuspeise"><div class="vegan_icon"><img src="Veggi.png"></div><div><span>Curry (Gl)</span> | Reis</div></div>
</div>
</body></html>"#;

    fn bot(canned: Canned) -> Arc<MensaBot<CannedSource>> {
        Arc::new(MensaBot::new(Config::default(), CannedSource::new(canned)).unwrap())
    }

    #[tokio::test]
    async fn test_triggered_message_is_answered_once() {
        let bot = bot(Canned::Page(PAGE));
        let sink = Arc::new(Recorder::default());
        let handle = dispatch(&bot, "Mensa heute?".to_owned(), &sink).expect("should trigger");
        handle.await.unwrap();
        assert_eq!(bot.source.calls.load(Ordering::SeqCst), 1);
        let replies = sink.replies();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("# Die Mensa empfiehlt:\n\n## Ausgabe 1\n![Veggi]("));
        assert!(replies[0].contains("Veggi.png)Curry \nReis"));
        assert_eq!(
            bot.source.urls.lock().unwrap()[0].query(),
            Some("building_id=1&display_type=1")
        );
    }

    #[tokio::test]
    async fn test_untriggered_message_is_ignored() {
        let bot = bot(Canned::Page(PAGE));
        let sink = Arc::new(Recorder::default());
        assert!(dispatch(&bot, "Wann ist das Meeting?".to_owned(), &sink).is_none());
        assert_eq!(bot.source.calls.load(Ordering::SeqCst), 0);
        assert!(sink.replies().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_triggers_are_independent() {
        let bot = bot(Canned::Page(PAGE));
        let sink = Arc::new(Recorder::default());
        let handles: Vec<_> = ["hunger!", "LUNCH?", "fooood", "kein trigger"]
            .into_iter()
            .filter_map(|m| dispatch(&bot, m.to_owned(), &sink))
            .collect();
        assert_eq!(handles.len(), 3);
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }
        assert_eq!(bot.source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.replies().len(), 3);
    }

    #[tokio::test]
    async fn test_status_failure_sends_two_replies() {
        let bot = bot(Canned::Status(StatusCode::NOT_FOUND));
        let sink = Recorder::default();
        bot.respond("mensa", &sink).await;
        assert_eq!(
            sink.replies(),
            vec![FAILURE_MESSAGE.to_owned(), "HTTP status 404 Not Found".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_week_request_reaches_the_source() {
        let bot = bot(Canned::Page(PAGE));
        let sink = Recorder::default();
        bot.respond("Mensaria nächste Woche", &sink).await;
        assert_eq!(
            bot.source.urls.lock().unwrap()[0].query(),
            Some("building_id=7&display_type=3")
        );
        // a single-day page falls back to the day layout
        assert!(sink.replies()[0].starts_with("# Die Mensaria empfiehlt:\n"));
    }

    #[tokio::test]
    async fn test_http_not_found_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/index.php")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let config = Config {
            page_url: format!("{}/index.php", server.url()),
            ..Config::default()
        };
        let bot = MensaBot::new(config, HttpSource::new(make_client().unwrap())).unwrap();
        let sink = Recorder::default();
        bot.respond("essen?", &sink).await;
        mock.assert_async().await;
        assert_eq!(
            sink.replies(),
            vec![FAILURE_MESSAGE.to_owned(), "HTTP status 404 Not Found".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_end_to_end() {
        let config = Config {
            page_url: "http://127.0.0.1:1/index.php".to_owned(),
            ..Config::default()
        };
        let bot = MensaBot::new(config, HttpSource::new(make_client().unwrap())).unwrap();
        let sink = Recorder::default();
        bot.respond("essen?", &sink).await;
        let replies = sink.replies();
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0], FAILURE_MESSAGE);
        assert!(replies[1].starts_with("Request error: "), "{replies:?}");
    }

    #[tokio::test]
    async fn test_serve_answers_every_line() {
        let bot = bot(Canned::Page(PAGE));
        let sink = Arc::new(Recorder::default());
        let input: &[u8] = b"mensa\r\n\xff\xfe hunger\nguten Morgen\nessen";
        serve(input, &bot, &sink, std::future::pending()).await;
        assert_eq!(bot.source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.replies().len(), 3);
    }

    #[tokio::test]
    async fn test_finished_tasks_are_reaped() {
        let mut pending = vec![
            tokio::spawn(async {
                panic!("reply task failed on purpose");
            }),
            tokio::spawn(std::future::pending::<()>()),
        ];
        while !pending[0].is_finished() {
            tokio::task::yield_now().await;
        }
        reap_finished(&mut pending).await;
        assert_eq!(pending.len(), 1);
        assert!(!pending[0].is_finished());
        pending[0].abort();
    }

    #[test]
    fn test_rejects_bad_page_url() {
        let config = Config {
            page_url: "not a url".to_owned(),
            ..Config::default()
        };
        let res = MensaBot::new(config, CannedSource::new(Canned::Page(PAGE)));
        assert!(matches!(res, Err(Error::Url(_))));
    }
}
