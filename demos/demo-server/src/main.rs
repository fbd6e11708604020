use baton::prelude::*;
use store::NoteStore;
use serde::Deserialize;
use serde_json::json;

mod store {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory notes keyed by id.
    #[derive(Default)]
    pub struct NoteStore {
        notes: Mutex<BTreeMap<i64, String>>,
    }

    impl NoteStore {
        pub fn insert(&self, text: String) -> i64 {
            let mut notes = self.notes.lock().unwrap_or_else(|e| e.into_inner());
            let id = notes.keys().next_back().map_or(1, |last| last + 1);
            notes.insert(id, text);
            id
        }

        pub fn get(&self, id: i64) -> Option<String> {
            let notes = self.notes.lock().unwrap_or_else(|e| e.into_inner());
            notes.get(&id).cloned()
        }

        pub fn list(&self) -> Vec<(i64, String)> {
            let notes = self.notes.lock().unwrap_or_else(|e| e.into_inner());
            notes.iter().map(|(id, text)| (*id, text.clone())).collect()
        }
    }
}

#[derive(Deserialize)]
struct NewNote {
    text: String,
}

fn controllers() -> Result<ControllerRegistry> {
    let registry = ControllerRegistry::new();

    registry.register(
        Controller::builder("notes.list")
            .argument(ArgumentMetadata::service::<NoteStore>("store"))
            .handler(handler_fn(|args: Arguments| async move {
                let store = args.service::<NoteStore>(0)?;
                let notes: Vec<_> = store
                    .list()
                    .into_iter()
                    .map(|(id, text)| json!({ "id": id, "text": text }))
                    .collect();
                Ok(Json(json!(notes)))
            }))
            .build()?,
    )?;

    registry.register(
        Controller::builder("notes.show")
            .argument(ArgumentMetadata::integer("id"))
            .argument(ArgumentMetadata::service::<NoteStore>("store"))
            .handler(handler_fn(|args: Arguments| async move {
                let id = args.int(0)?;
                let store = args.service::<NoteStore>(1)?;
                Ok(match store.get(id) {
                    Some(text) => (StatusCode::OK, Json(json!({ "id": id, "text": text }))),
                    None => (StatusCode::NOT_FOUND, Json(json!({ "error": "no such note" }))),
                })
            }))
            .build()?,
    )?;

    registry.register(
        Controller::builder("notes.create")
            .argument(ArgumentMetadata::json("note").from_source(ArgumentSource::Body))
            .argument(ArgumentMetadata::service::<NoteStore>("store"))
            .handler(handler_fn(|args: Arguments| async move {
                let note: NewNote = args.json(0)?;
                let id = args.service::<NoteStore>(1)?.insert(note.text);
                Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
            }))
            .build()?,
    )?;

    Ok(registry)
}

fn routes() -> Result<RouteTable> {
    let mut routes = RouteTable::new();
    routes
        .get("/notes", "notes.list")?
        .get("/notes/{id}", "notes.show")?
        .post("/notes", "notes.create")?;
    Ok(routes)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = KernelConfig::from_env()?;
    let container = ContainerBuilder::new().register(NoteStore::default()).build();

    let resolver = AttributeControllerResolver::new(
        controllers()?,
        ArgumentResolver::new(Arc::new(container)),
    );

    let kernel = HttpKernel::new(resolver)
        .with_config(config)
        .with_routes(Arc::new(routes()?));

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;

    kernel.serve(listener).await?;
    Ok(())
}
