//! Integration tests for datacache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn datacache(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("datacache");
        cmd.arg("--config").arg(config).env_remove("DATACACHE_PASSWORD");
        cmd
    }

    /// Config file whose dataset roots live under `<temp>/data`
    fn write_config(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("config.toml");
        let root = temp.path().join("data");
        fs::write(
            &path,
            format!(
                "[general]\nroot = '{}'\nshow_progress = false\n",
                root.display()
            ),
        )
        .unwrap();
        path
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        datacache(&write_config(&temp))
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "URL-addressed on-disk cache for scientific data sets",
            ));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        datacache(&write_config(&temp))
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("datacache"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        datacache(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        datacache(&write_config(&temp))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[transport]"));
    }

    #[test]
    fn config_set_persists() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        datacache(&config)
            .args(["config", "set", "transport.timeout_secs", "45"])
            .assert()
            .success();

        assert!(fs::read_to_string(&config)
            .unwrap()
            .contains("timeout_secs = 45"));
    }

    #[test]
    fn fetch_local_file_prints_cache_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let source = temp.path().join("grid.nc");
        fs::write(&source, b"gridded values").unwrap();
        let source = source.to_str().unwrap().to_string();

        let output = datacache(&config)
            .args(["fetch", "demo", &source, "--no-progress"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let printed = String::from_utf8(output).unwrap();
        let cached = PathBuf::from(printed.trim());
        assert!(cached.starts_with(temp.path().join("data").join("demo").join("file")));
        assert_eq!(fs::read(&cached).unwrap(), b"gridded values");

        datacache(&config)
            .args(["list", "demo", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains(printed.trim()));

        datacache(&config)
            .args(["list", "demo", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"size\": 14"));
    }

    #[test]
    fn fetch_reads_url_list() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let a = temp.path().join("a.nc");
        let b = temp.path().join("b.nc");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"b").unwrap();
        let list = temp.path().join("urls.txt");
        fs::write(
            &list,
            format!("# sources\n{}\n\n{}\n", a.display(), b.display()),
        )
        .unwrap();

        let output = datacache(&config)
            .args(["fetch", "demo", "--input"])
            .arg(&list)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let printed = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("a.nc"));
        assert!(lines[1].ends_with("b.nc"));
    }

    #[test]
    fn location_prints_and_sets() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        datacache(&config)
            .args(["location", "GRACE"])
            .assert()
            .success()
            .stdout(predicate::str::contains("grace"));

        let custom = temp.path().join("grace-store");
        datacache(&config)
            .args(["location", "grace", "--set"])
            .arg(&custom)
            .assert()
            .success();

        assert!(custom.is_dir());
        datacache(&config)
            .args(["location", "grace"])
            .assert()
            .success()
            .stdout(predicate::str::contains("grace-store"));
    }

    #[test]
    fn list_unknown_dataset_leaves_no_trace() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        datacache(&config)
            .args(["list", "neverused", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));

        assert!(!temp.path().join("data").exists());
        assert!(!fs::read_to_string(&config).unwrap().contains("neverused"));
    }

    #[test]
    fn session_with_auth_url_is_usage_error() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        datacache(&config)
            .args([
                "fetch",
                "demo",
                "http://example.org/a.nc",
                "--session",
                "--auth-url",
                "https://urs.example.org/",
            ])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid option combination"));

        assert!(!temp.path().join("data").join("demo").exists());
    }

    #[test]
    fn malformed_url_fails() {
        let temp = TempDir::new().unwrap();
        datacache(&write_config(&temp))
            .args(["fetch", "demo", "not a url"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Malformed URL 'not a url'"));
    }

    #[test]
    fn fetch_without_urls_fails() {
        let temp = TempDir::new().unwrap();
        datacache(&write_config(&temp))
            .args(["fetch", "demo"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("no URLs given"));
    }
}

mod http_tests {
    use datacache::cache::{local_path, parse_source, ContentCache};
    use datacache::config::{Config, ConfigManager, TransportConfig};
    use datacache::error::CacheError;
    use datacache::transport::{Credentials, FetchOptions, TransportContext, TransportKind};
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::{Arc, Mutex};
    use std::thread;
    use tempfile::TempDir;

    const GOOD_AUTH: &str = "Basic YWxpY2U6czNjcmV0"; // alice:s3cret

    #[derive(Debug, Clone)]
    struct Request {
        host: String,
        path: String,
        authorization: Option<String>,
        cookie: Option<String>,
    }

    impl Request {
        fn has_cookie(&self, pair: &str) -> bool {
            self.cookie
                .as_deref()
                .is_some_and(|c| c.split(';').any(|p| p.trim() == pair))
        }
    }

    struct Reply {
        status: u16,
        headers: Vec<(&'static str, String)>,
        body: Vec<u8>,
    }

    impl Reply {
        fn ok(body: &str) -> Self {
            Self {
                status: 200,
                headers: Vec::new(),
                body: body.as_bytes().to_vec(),
            }
        }

        fn status(status: u16) -> Self {
            Self {
                status,
                headers: Vec::new(),
                body: Vec::new(),
            }
        }

        fn redirect(location: String) -> Self {
            Self {
                headers: vec![("Location", location)],
                ..Self::status(302)
            }
        }

        /// Close the connection without answering
        fn hang_up() -> Self {
            Self::status(0)
        }
    }

    /// Minimal HTTP/1.1 server on a random local port
    struct TestServer {
        base: String,
        hits: Arc<Mutex<HashMap<String, usize>>>,
        log: Arc<Mutex<Vec<Request>>>,
    }

    impl TestServer {
        fn start<F>(handler: F) -> Self
        where
            F: Fn(&Request, &str) -> Reply + Send + 'static,
        {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let base = format!("http://{}", listener.local_addr().unwrap());
            let hits = Arc::new(Mutex::new(HashMap::new()));
            let log = Arc::new(Mutex::new(Vec::new()));

            let thread_base = base.clone();
            let thread_hits = Arc::clone(&hits);
            let thread_log = Arc::clone(&log);
            thread::spawn(move || {
                for stream in listener.incoming().flatten() {
                    handle(stream, &handler, &thread_base, &thread_hits, &thread_log);
                }
            });

            Self { base, hits, log }
        }

        /// Same server reached through a different host name
        fn login_base(&self) -> String {
            self.base.replace("127.0.0.1", "localhost")
        }

        fn requests(&self) -> Vec<Request> {
            self.log.lock().unwrap().clone()
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base, path)
        }

        fn hits(&self, path: &str) -> usize {
            self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
        }
    }

    fn handle<F>(
        stream: TcpStream,
        handler: &F,
        base: &str,
        hits: &Mutex<HashMap<String, usize>>,
        log: &Mutex<Vec<Request>>,
    ) where
        F: Fn(&Request, &str) -> Reply,
    {
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request_line = String::new();
        if reader.read_line(&mut request_line).is_err() {
            return;
        }
        let path = request_line
            .split_whitespace()
            .nth(1)
            .unwrap_or("/")
            .to_string();

        let mut host = String::new();
        let mut authorization = None;
        let mut cookie = None;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim().to_string();
                if name.eq_ignore_ascii_case("host") {
                    host = value;
                } else if name.eq_ignore_ascii_case("authorization") {
                    authorization = Some(value);
                } else if name.eq_ignore_ascii_case("cookie") {
                    cookie = Some(value);
                }
            }
        }

        *hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;
        let request = Request {
            host,
            path,
            authorization,
            cookie,
        };
        log.lock().unwrap().push(request.clone());

        let reply = handler(&request, base);
        if reply.status == 0 {
            return;
        }

        let mut out = stream;
        let mut head = format!(
            "HTTP/1.1 {} Test\r\nContent-Length: {}\r\nConnection: close\r\n",
            reply.status,
            reply.body.len()
        );
        for (name, value) in &reply.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        let _ = out.write_all(head.as_bytes());
        let _ = out.write_all(&reply.body);
        let _ = out.flush();
    }

    fn cache(temp: &TempDir) -> ContentCache {
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));
        let mut config = Config::default();
        config.general.root = Some(temp.path().join("data"));
        manager.save(&config).unwrap();
        ContentCache::new(manager, TransportConfig::default())
    }

    fn options(transport: TransportKind, credentials: Option<Credentials>) -> FetchOptions {
        FetchOptions {
            credentials,
            transport,
            ..Default::default()
        }
    }

    #[test]
    fn basic_download_then_reuse() {
        let server = TestServer::start(|req, _| match req.path.as_str() {
            "/grace/a.nc" => Reply::ok("grid a"),
            "/grace/a.nc?month=2" => Reply::ok("grid a, month 2"),
            _ => Reply::status(404),
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let urls = [server.url("/grace/a.nc"), server.url("/grace/a.nc?month=2")];
        let opts = options(TransportKind::Basic, None);

        let first = cache.cache_data("grace", &urls, &opts).unwrap();
        let second = cache.cache_data("grace", &urls, &opts).unwrap();

        assert_eq!(first, second);
        assert_eq!(std::fs::read_to_string(&first[0]).unwrap(), "grid a");
        assert_eq!(std::fs::read_to_string(&first[1]).unwrap(), "grid a, month 2");
        assert!(first[1].to_str().unwrap().ends_with("a.nc?month=2"));
        assert_eq!(server.hits("/grace/a.nc"), 1);
        assert_eq!(server.hits("/grace/a.nc?month=2"), 1);
    }

    #[test]
    fn basic_answers_challenge_with_credentials() {
        let server = TestServer::start(|req, _| match req.authorization.as_deref() {
            Some(GOOD_AUTH) => Reply::ok("protected grid"),
            _ => Reply {
                headers: vec![("WWW-Authenticate", "Basic realm=\"data\"".to_string())],
                ..Reply::status(401)
            },
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/protected/f.nc");

        let paths = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Basic, Some(Credentials::new("alice", "s3cret"))),
            )
            .unwrap();

        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "protected grid");
        // Unauthenticated attempt, then the answer to the challenge
        assert_eq!(server.hits("/protected/f.nc"), 2);
    }

    #[test]
    fn basic_without_credentials_is_authentication_error() {
        let server = TestServer::start(|_, _| Reply::status(401));
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/protected/f.nc");

        let err = cache
            .cache_data("grace", &[&url], &options(TransportKind::Basic, None))
            .unwrap_err();

        assert!(matches!(err, CacheError::Authentication { status: 401, .. }));
        assert!(cache.cached_entries("grace").unwrap().is_empty());
    }

    #[test]
    fn session_reissues_at_final_location() {
        let server = TestServer::start(|req, base| match req.path.as_str() {
            "/granule/f.nc" => Reply {
                headers: vec![("Location", format!("{}/login/f.nc", base))],
                ..Reply::status(302)
            },
            "/login/f.nc" => match req.authorization.as_deref() {
                Some(GOOD_AUTH) => Reply::ok("session grid"),
                _ => Reply::status(401),
            },
            _ => Reply::status(404),
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/granule/f.nc");

        let paths = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Session, Some(Credentials::new("alice", "s3cret"))),
            )
            .unwrap();

        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "session grid");
        assert!(paths[0].ends_with("granule/f.nc"));
        assert_eq!(server.hits("/login/f.nc"), 2);
    }

    #[test]
    fn session_wrong_credentials_leaves_no_file() {
        let server = TestServer::start(|req, _| match req.authorization.as_deref() {
            Some(GOOD_AUTH) => Reply::ok("session grid"),
            _ => Reply::status(401),
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/granule/f.nc");

        let err = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Session, Some(Credentials::new("alice", "wrong"))),
            )
            .unwrap_err();

        assert!(matches!(err, CacheError::Authentication { .. }));
        let root = cache.data_location("grace").unwrap();
        assert!(!local_path(&root, &parse_source(&url).unwrap()).exists());
        assert!(cache.cached_entries("grace").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_transfer_error() {
        let server = TestServer::start(|_, _| Reply::status(404));
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/nothing/here.nc");

        let err = cache
            .cache_data("grace", &[&url], &options(TransportKind::Basic, None))
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(err.to_string().contains("HTTP 404"));
    }

    #[test]
    fn shared_context_serves_several_calls() {
        let server = TestServer::start(|_, _| Reply::ok("x"));
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let context = TransportContext::new(
            &options(TransportKind::Basic, None),
            &TransportConfig::default(),
        )
        .unwrap();

        cache
            .cache_data_with("grace", &[server.url("/a.nc")], &context, false)
            .unwrap();
        cache
            .cache_data_with("srtm", &[server.url("/a.nc")], &context, false)
            .unwrap();

        // Separate datasets keep separate copies
        assert_eq!(server.hits("/a.nc"), 2);
    }

    #[test]
    fn shared_context_keeps_cookies() {
        let server = TestServer::start(|req, _| match req.path.as_str() {
            "/session/start.nc" => Reply {
                headers: vec![("Set-Cookie", "sid=xyz; Path=/".to_string())],
                ..Reply::ok("start")
            },
            "/session/grid.nc" if req.has_cookie("sid=xyz") => Reply::ok("grid"),
            _ => Reply::status(401),
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let context = TransportContext::new(
            &options(TransportKind::Basic, None),
            &TransportConfig::default(),
        )
        .unwrap();

        cache
            .cache_data_with("grace", &[server.url("/session/start.nc")], &context, false)
            .unwrap();
        let paths = cache
            .cache_data_with("grace", &[server.url("/session/grid.nc")], &context, false)
            .unwrap();

        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "grid");

        // A fresh context starts without the cookie
        let err = cache
            .cache_data(
                "srtm",
                &[server.url("/session/grid.nc")],
                &options(TransportKind::Basic, None),
            )
            .unwrap_err();
        assert!(matches!(err, CacheError::Authentication { status: 401, .. }));
    }

    /// Data on 127.0.0.1 behind a login service reached as localhost. The data
    /// host redirects to `/oauth`, which sends an authenticated user back
    /// through `/exchange`, where the session cookie is set.
    fn login_flow(req: &Request, base: &str) -> Reply {
        let login = base.replace("127.0.0.1", "localhost");
        match req.path.as_str() {
            "/data/f.nc" if req.has_cookie("sid=abc") => Reply::ok("protected grid"),
            "/data/f.nc" => Reply::redirect(format!("{}/oauth", login)),
            "/oauth" => match req.authorization.as_deref() {
                Some(GOOD_AUTH) => Reply::redirect(format!("{}/exchange?code=abc", base)),
                _ => Reply {
                    headers: vec![("WWW-Authenticate", "Basic realm=\"login\"".to_string())],
                    ..Reply::status(401)
                },
            },
            "/exchange?code=abc" => Reply {
                headers: vec![
                    ("Set-Cookie", "sid=abc; Path=/".to_string()),
                    ("Location", format!("{}/data/f.nc", base)),
                ],
                ..Reply::status(302)
            },
            _ => Reply::status(404),
        }
    }

    /// `(host, path)` of every request that carried credentials
    fn credentialed(server: &TestServer) -> Vec<(String, String)> {
        server
            .requests()
            .into_iter()
            .filter(|r| r.authorization.is_some())
            .map(|r| (r.host, r.path))
            .collect()
    }

    fn login_host(server: &TestServer) -> String {
        server.login_base().trim_start_matches("http://").to_string()
    }

    #[test]
    fn session_logs_in_on_other_host() {
        let server = TestServer::start(login_flow);
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/data/f.nc");

        let paths = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Session, Some(Credentials::new("alice", "s3cret"))),
            )
            .unwrap();

        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "protected grid");
        assert!(paths[0].ends_with("data/f.nc"));
        assert_eq!(
            credentialed(&server),
            vec![(login_host(&server), "/oauth".to_string())]
        );
        let last = server.requests().pop().unwrap();
        assert_eq!(last.path, "/data/f.nc");
        assert!(last.has_cookie("sid=abc"));
    }

    #[test]
    fn basic_answers_login_host_listed_in_auth_urls() {
        let server = TestServer::start(login_flow);
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/data/f.nc");
        let opts = FetchOptions {
            auth_urls: vec![format!("{}/oauth", server.login_base())],
            ..options(TransportKind::Basic, Some(Credentials::new("alice", "s3cret")))
        };

        let paths = cache.cache_data("grace", &[&url], &opts).unwrap();

        assert_eq!(std::fs::read_to_string(&paths[0]).unwrap(), "protected grid");
        assert_eq!(
            credentialed(&server),
            vec![(login_host(&server), "/oauth".to_string())]
        );
    }

    #[test]
    fn basic_keeps_credentials_from_unlisted_login_host() {
        let server = TestServer::start(login_flow);
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/data/f.nc");

        let err = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Basic, Some(Credentials::new("alice", "s3cret"))),
            )
            .unwrap_err();

        assert!(matches!(err, CacheError::Authentication { ref url, status: 401 } if url.ends_with("/data/f.nc")));
        assert!(credentialed(&server).is_empty());
        assert!(server.hits("/oauth") > 0);
        assert!(cache.cached_entries("grace").unwrap().is_empty());
    }

    #[test]
    fn failed_reissue_names_requested_url() {
        let server = TestServer::start(|req, base| match req.path.as_str() {
            "/granule/f.nc" => Reply::redirect(format!("{}/login", base)),
            "/login" if req.authorization.is_some() => Reply::hang_up(),
            _ => Reply::status(401),
        });
        let temp = TempDir::new().unwrap();
        let cache = cache(&temp);
        let url = server.url("/granule/f.nc");

        let err = cache
            .cache_data(
                "grace",
                &[&url],
                &options(TransportKind::Session, Some(Credentials::new("alice", "s3cret"))),
            )
            .unwrap_err();

        assert!(
            matches!(err, CacheError::Transfer { url: ref failed, .. } if *failed == url),
            "{err}"
        );
    }
}
