use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Serves fixed pages keyed by path and records every path requested.
pub struct SiteStub {
    pub base_url: String,
    hits: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

#[allow(dead_code)]
impl SiteStub {
    pub fn spawn(routes: Vec<(&str, u16, String)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start site stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let routes: HashMap<String, (u16, String)> = routes
            .into_iter()
            .map(|(path, status, body)| (path.to_owned(), (status, body)))
            .collect();

        let hits = Arc::new(Mutex::new(Vec::<String>::new()));
        let recorded = Arc::clone(&hits);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                recorded
                    .lock()
                    .expect("lock recorded hits")
                    .push(path.clone());

                let (status, body) = routes
                    .get(&path)
                    .cloned()
                    .unwrap_or_else(|| (404, "not found".to_owned()));
                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"text/html; charset=utf-8"[..],
                )
                .expect("build header");
                let _ = request.respond(
                    tiny_http::Response::from_string(body)
                        .with_status_code(status)
                        .with_header(header),
                );
            }
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().expect("lock recorded hits").clone()
    }
}

impl Drop for SiteStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// One catalog entry in the site's markup.
#[allow(dead_code)]
pub fn catalog_entry(title: &str, teaser: &str, description: &str, pdf: &str, image: &str) -> String {
    format!(
        r#"<div class="gb-loop-item caja-pdfs caja-pdfs-nuevo">
  <img src="data:image/svg+xml;base64,AAAA" data-src="{image}">
  <h3 class="gb-text titulo-caja-pdfs">{title}</h3>
  <p class="gb-text descripcion-caja-pdfs">{teaser}</p>
  <p class="gb-text descripcion-caja-pdfs">{description}</p>
  <a class="gb-text boton-descarga-caja-pdfs" href="{pdf}">Baixar</a>
</div>"#
    )
}

#[allow(dead_code)]
pub fn html_page(body: &str) -> String {
    format!("<!doctype html>\n<html><head><title>Livros</title></head><body>\n{body}\n</body></html>\n")
}
