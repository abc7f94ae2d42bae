//! The create/edit dialog shared by every resource kind.
//!
//! ```text
//! Closed --open--> Editing --submit(valid)--> Submitting --ok--> Closed
//!                     ^  \--submit(invalid)--/     |
//!                     |                            |
//!                     +-----------error------------+
//! ```
//!
//! Any state returns to `Closed` on cancel, discarding the form and any
//! picked image.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use super::api::{ClientResult, ImageAttachment, ResourceClient};
use super::cache::QueryCache;
use super::submit::{DialogSubmitController, OnSave};
use crate::domain::ResourceKind;

/// Local field state for one resource kind.
pub trait ResourceForm: Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn blank() -> Self;

    /// Seeds the fields from a client-shape item.
    fn from_item(item: &Value) -> Self;

    /// Checks run before any request; the error is shown as a toast.
    fn validate(&self) -> Result<(), String>;

    /// Client-shape body for create and update.
    fn to_payload(&self) -> Value;

    fn supports_image() -> bool {
        Self::KIND.image_field().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Editing,
    Submitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Saved(Value),
    /// Local validation failed; nothing was sent.
    Invalid(String),
    /// The request failed; fields are kept for a retry.
    Failed(String),
    /// A submit is already in flight.
    Busy,
    NotOpen,
}

type OpenChange = Arc<dyn Fn(bool) + Send + Sync>;
type OnSuccess = Arc<dyn Fn(&Value) + Send + Sync>;

struct Session<F> {
    /// Bumped on every open and cancel; a response only lands on the
    /// session that sent it.
    generation: u64,
    state: DialogState,
    form: F,
    edit_item: Option<Value>,
    image: Option<ImageAttachment>,
    preview: Option<String>,
    toast: Option<String>,
}

impl<F: ResourceForm> Session<F> {
    fn closed() -> Self {
        Self {
            generation: 0,
            state: DialogState::Closed,
            form: F::blank(),
            edit_item: None,
            image: None,
            preview: None,
            toast: None,
        }
    }

    fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self::closed();
        self.generation = generation;
    }
}

fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub struct ResourceDialog<F: ResourceForm, C: ResourceClient + ?Sized = dyn ResourceClient> {
    client: Arc<C>,
    cache: QueryCache,
    session: Mutex<Session<F>>,
    on_open_change: Option<OpenChange>,
    on_success: Option<OnSuccess>,
    submit: DialogSubmitController,
}

impl<F: ResourceForm, C: ResourceClient + ?Sized> ResourceDialog<F, C> {
    pub fn new(client: Arc<C>, cache: QueryCache) -> Self {
        Self {
            client,
            cache,
            session: Mutex::new(Session::closed()),
            on_open_change: None,
            on_success: None,
            submit: DialogSubmitController::new(),
        }
    }

    pub fn on_open_change(mut self, callback: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_open_change = Some(Arc::new(callback));
        self
    }

    pub fn on_success(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_save(mut self, callback: OnSave) -> Self {
        self.submit = DialogSubmitController::with_on_save(callback);
        self
    }

    /// Reports saved items through an enclosing dialog's controller instead.
    pub fn with_submit_controller(mut self, controller: DialogSubmitController) -> Self {
        self.submit = controller;
        self
    }

    pub fn submit_controller(&self) -> &DialogSubmitController {
        &self.submit
    }

    fn session(&self) -> MutexGuard<'_, Session<F>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Opens in edit mode when `edit_item` is given, otherwise blank.
    pub fn open(&self, edit_item: Option<Value>) {
        let mut session = self.session();
        session.reset();
        session.form = edit_item.as_ref().map(F::from_item).unwrap_or_else(F::blank);
        session.edit_item = edit_item;
        session.state = DialogState::Editing;
    }

    /// The `open` / `onOpenChange` pair: `false` behaves like a dismissal.
    pub fn set_open(&self, open: bool) {
        if open {
            if self.state() == DialogState::Closed {
                self.open(None);
            }
        } else {
            self.cancel();
        }
    }

    pub fn cancel(&self) {
        let was_open = {
            let mut session = self.session();
            let was_open = session.state != DialogState::Closed;
            session.reset();
            was_open
        };
        if was_open {
            if let Some(callback) = &self.on_open_change {
                callback(false);
            }
        }
    }

    pub fn state(&self) -> DialogState {
        self.session().state
    }

    pub fn is_open(&self) -> bool {
        self.state() != DialogState::Closed
    }

    pub fn mode(&self) -> DialogMode {
        if self.session().edit_item.is_some() {
            DialogMode::Edit
        } else {
            DialogMode::Create
        }
    }

    pub fn form(&self) -> F {
        self.session().form.clone()
    }

    pub fn update_form(&self, edit: impl FnOnce(&mut F)) {
        edit(&mut self.session().form);
    }

    pub fn toast(&self) -> Option<String> {
        self.session().toast.clone()
    }

    pub fn pending_image(&self) -> Option<ImageAttachment> {
        self.session().image.clone()
    }

    /// The picked image's preview, else the persisted image URL.
    pub fn preview(&self) -> Option<String> {
        let session = self.session();
        if let Some(preview) = &session.preview {
            return Some(preview.clone());
        }
        let field = F::KIND.image_field()?;
        session
            .edit_item
            .as_ref()
            .and_then(|item| item.get(field))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Replaces the pending image and its preview.
    pub fn attach_image(&self, image: ImageAttachment) -> Result<(), String> {
        if !F::supports_image() {
            return Err(format!("{} records do not take an image", F::KIND.label()));
        }
        if !image.content_type.starts_with("image/") {
            return Err("Please choose an image file".into());
        }
        let mut session = self.session();
        session.preview = Some(image.preview());
        session.image = Some(image);
        Ok(())
    }

    pub fn clear_image(&self) {
        let mut session = self.session();
        session.image = None;
        session.preview = None;
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let (generation, payload, edit_id, image) = {
            let mut session = self.session();
            match session.state {
                DialogState::Closed => return SubmitOutcome::NotOpen,
                DialogState::Submitting => return SubmitOutcome::Busy,
                DialogState::Editing => {}
            }
            if let Err(message) = session.form.validate() {
                session.toast = Some(message.clone());
                return SubmitOutcome::Invalid(message);
            }
            session.state = DialogState::Submitting;
            session.toast = None;
            (
                session.generation,
                session.form.to_payload(),
                session.edit_item.as_ref().and_then(item_id),
                session.image.clone(),
            )
        };

        let collection = F::KIND.path();
        match self.send(collection, payload, edit_id, image).await {
            Ok(item) => self.finish(generation, collection, item).await,
            Err(err) => {
                let message = err.user_message();
                tracing::warn!(kind = collection, error = %err, "dialog submit failed");
                let mut session = self.session();
                if session.generation == generation && session.state == DialogState::Submitting {
                    session.state = DialogState::Editing;
                    session.toast = Some(message.clone());
                }
                SubmitOutcome::Failed(message)
            }
        }
    }

    async fn send(
        &self,
        collection: &str,
        payload: Value,
        edit_id: Option<String>,
        image: Option<ImageAttachment>,
    ) -> ClientResult<Value> {
        match (edit_id, image) {
            (None, None) => self.client.create(collection, payload).await,
            (None, Some(image)) => {
                self.client
                    .create_with_image(collection, payload, &image)
                    .await
            }
            (Some(id), None) => self.client.update(collection, &id, payload).await,
            (Some(id), Some(image)) => {
                let url = self.client.upload_image(collection, &image).await?;
                let mut payload = payload;
                if let (Some(field), Some(body)) = (F::KIND.image_field(), payload.as_object_mut())
                {
                    body.insert(field.to_string(), Value::String(url));
                }
                self.client.update(collection, &id, payload).await
            }
        }
    }

    async fn finish(&self, generation: u64, collection: &str, item: Value) -> SubmitOutcome {
        let still_open = {
            let mut session = self.session();
            let still_open =
                session.generation == generation && session.state == DialogState::Submitting;
            if still_open {
                session.reset();
            }
            still_open
        };

        // Cancelled mid-flight: the write stands but nobody is listening.
        if still_open {
            if let Some(callback) = &self.on_open_change {
                callback(false);
            }
            if let Some(callback) = &self.on_success {
                callback(&item);
            }
            self.submit.set_result(item.clone());
            self.submit.trigger_submit().await;
        }

        self.cache.invalidate(collection);
        SubmitOutcome::Saved(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::api::ClientError;
    use crate::client::forms::{EquipmentForm, LocationForm};
    use crate::client::submit::on_save;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeClient {
        calls: Mutex<Vec<(String, Value)>>,
        failure: Mutex<Option<(u16, String)>>,
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl FakeClient {
        fn failing(status: u16, message: &str) -> Self {
            let client = Self::default();
            *client.failure.lock().unwrap() = Some((status, message.to_string()));
            client
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        async fn respond(&self, call: &str, payload: Value) -> ClientResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((call.to_string(), payload.clone()));
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            let failure = self.failure.lock().unwrap().clone();
            if let Some((status, message)) = failure {
                return Err(ClientError::Api { status, message });
            }
            let mut item = payload;
            if let Some(body) = item.as_object_mut() {
                body.entry("id").or_insert(json!("eq-1"));
            }
            Ok(item)
        }
    }

    #[async_trait]
    impl ResourceClient for FakeClient {
        async fn list(&self, _collection: &str) -> ClientResult<Vec<Value>> {
            Ok(Vec::new())
        }

        async fn create(&self, collection: &str, payload: Value) -> ClientResult<Value> {
            self.respond(&format!("create {collection}"), payload).await
        }

        async fn create_with_image(
            &self,
            collection: &str,
            payload: Value,
            image: &ImageAttachment,
        ) -> ClientResult<Value> {
            let mut payload = payload;
            payload["imageUrl"] = json!(format!("https://cdn/{}", image.filename));
            self.respond(&format!("create_with_image {collection}"), payload)
                .await
        }

        async fn update(&self, collection: &str, id: &str, patch: Value) -> ClientResult<Value> {
            let mut patch = patch;
            patch["id"] = json!(id);
            self.respond(&format!("update {collection}"), patch).await
        }

        async fn delete(&self, _collection: &str, _id: &str) -> ClientResult<()> {
            Ok(())
        }

        async fn upload_image(
            &self,
            collection: &str,
            image: &ImageAttachment,
        ) -> ClientResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((format!("upload {collection}"), json!(image.filename)));
            Ok(format!("https://cdn/{}", image.filename))
        }
    }

    fn png(name: &str) -> ImageAttachment {
        ImageAttachment::new(name, "image/png", vec![1, 2, 3])
    }

    fn dialog(client: Arc<FakeClient>) -> ResourceDialog<EquipmentForm, FakeClient> {
        ResourceDialog::new(client, QueryCache::new())
    }

    #[tokio::test]
    async fn empty_required_field_never_reaches_the_client() {
        let client = Arc::new(FakeClient::default());
        let dialog = dialog(Arc::clone(&client));
        dialog.open(None);
        dialog.update_form(|form| form.category = "Camera".into());

        let outcome = dialog.submit().await;

        assert_eq!(outcome, SubmitOutcome::Invalid("Name is required".into()));
        assert!(client.calls().is_empty());
        assert_eq!(dialog.state(), DialogState::Editing);
        assert_eq!(dialog.toast().as_deref(), Some("Name is required"));
    }

    #[tokio::test]
    async fn edit_mode_prepopulates_and_cancel_discards() {
        let client = Arc::new(FakeClient::default());
        let closes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&closes);
        let dialog = dialog(Arc::clone(&client))
            .on_open_change(move |open| sink.lock().unwrap().push(open));

        dialog.open(Some(json!({
            "id": "eq-9",
            "name": "Canon 5D",
            "category": "Camera",
            "quantity": 2,
            "available": true,
        })));
        let form = dialog.form();
        assert_eq!(dialog.mode(), DialogMode::Edit);
        assert_eq!(form.name, "Canon 5D");
        assert_eq!(form.category, "Camera");
        assert_eq!(form.quantity, "2");
        assert!(form.available);

        dialog.update_form(|form| form.name = "Changed".into());
        dialog.cancel();

        assert!(client.calls().is_empty());
        assert_eq!(dialog.state(), DialogState::Closed);
        assert_eq!(*closes.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn successful_create_closes_and_notifies_everyone() {
        let client = Arc::new(FakeClient::default());
        let cache = QueryCache::new();
        cache.put("equipment", 0, vec![json!({ "id": "old" })]);

        let events = Arc::new(Mutex::new(Vec::<String>::new()));
        let (open_sink, success_sink, save_sink) =
            (Arc::clone(&events), Arc::clone(&events), Arc::clone(&events));
        let dialog: ResourceDialog<EquipmentForm, FakeClient> =
            ResourceDialog::new(Arc::clone(&client), cache.clone())
                .on_open_change(move |open| open_sink.lock().unwrap().push(format!("open:{open}")))
                .on_success(move |item| {
                    success_sink
                        .lock()
                        .unwrap()
                        .push(format!("success:{}", item["id"].as_str().unwrap_or_default()))
                })
                .on_save(on_save(move |item| {
                    let sink = Arc::clone(&save_sink);
                    async move {
                        let id = item
                            .as_ref()
                            .and_then(|item| item["id"].as_str().map(str::to_string))
                            .unwrap_or_default();
                        sink.lock().unwrap().push(format!("save:{id}"));
                        Ok(())
                    }
                }));

        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "New Camera".into();
            form.category = "Camera".into();
        });
        dialog.attach_image(png("camera.png")).unwrap();
        assert!(dialog.preview().unwrap().starts_with("data:image/png;base64,"));

        let outcome = dialog.submit().await;

        let SubmitOutcome::Saved(item) = outcome else {
            panic!("expected a saved item, got {outcome:?}");
        };
        assert_eq!(item["id"], json!("eq-1"));
        assert_eq!(item["name"], json!("New Camera"));
        assert_eq!(
            *events.lock().unwrap(),
            vec!["open:false", "success:eq-1", "save:eq-1"]
        );
        assert_eq!(client.calls()[0].0, "create_with_image equipment");
        assert_eq!(dialog.state(), DialogState::Closed);
        assert!(dialog.pending_image().is_none());
        assert!(cache.get("equipment").is_none());

        dialog.open(None);
        assert_eq!(dialog.form(), EquipmentForm::blank());
        assert!(dialog.preview().is_none());
    }

    #[tokio::test]
    async fn server_errors_keep_fields_for_retry() {
        let client = Arc::new(FakeClient::failing(400, "category is required"));
        let dialog = dialog(Arc::clone(&client));
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "Tripod".into();
            form.category = "Support".into();
        });

        let outcome = dialog.submit().await;

        assert_eq!(outcome, SubmitOutcome::Failed("category is required".into()));
        assert_eq!(dialog.state(), DialogState::Editing);
        assert_eq!(dialog.form().name, "Tripod");
        assert_eq!(dialog.toast().as_deref(), Some("category is required"));
    }

    #[tokio::test]
    async fn silent_server_errors_use_fallback_text() {
        let client = Arc::new(FakeClient::failing(500, ""));
        let dialog = dialog(client);
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "Tripod".into();
            form.category = "Support".into();
        });

        assert_eq!(
            dialog.submit().await,
            SubmitOutcome::Failed("Something went wrong".into())
        );
    }

    #[tokio::test]
    async fn edit_with_new_image_uploads_then_patches_url() {
        let client = Arc::new(FakeClient::default());
        let dialog = dialog(Arc::clone(&client));
        dialog.open(Some(json!({
            "id": "eq-7",
            "name": "Softbox",
            "category": "Lighting",
            "quantity": 1,
            "available": true,
            "imageUrl": "https://cdn/old.png",
        })));
        assert_eq!(dialog.preview().as_deref(), Some("https://cdn/old.png"));
        dialog.attach_image(png("new.png")).unwrap();

        let outcome = dialog.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Saved(_)));
        let calls = client.calls();
        assert_eq!(calls[0].0, "upload equipment");
        assert_eq!(calls[1].0, "update equipment");
        assert_eq!(calls[1].1["imageUrl"], json!("https://cdn/new.png"));
        assert_eq!(calls[1].1["id"], json!("eq-7"));
    }

    #[tokio::test]
    async fn edit_without_image_sends_plain_update() {
        let client = Arc::new(FakeClient::default());
        let dialog = dialog(Arc::clone(&client));
        dialog.open(Some(json!({ "id": "eq-3", "name": "Reflector", "category": "Lighting" })));

        dialog.submit().await;

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "update equipment");
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_rejected() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let client = Arc::new(FakeClient {
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..FakeClient::default()
        });
        let dialog = dialog(Arc::clone(&client));
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "Canon EOS R5".into();
            form.category = "Camera".into();
        });

        let (first, second) = tokio::join!(dialog.submit(), async {
            entered.notified().await;
            let second = dialog.submit().await;
            release.notify_one();
            second
        });

        assert!(matches!(first, SubmitOutcome::Saved(_)));
        assert_eq!(second, SubmitOutcome::Busy);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn late_response_leaves_reopened_dialog_alone() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let client = Arc::new(FakeClient {
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..FakeClient::default()
        });
        let cache = QueryCache::new();
        cache.put("equipment", 0, vec![json!({ "id": "old" })]);
        let events = Arc::new(Mutex::new(Vec::<String>::new()));
        let (open_sink, success_sink) = (Arc::clone(&events), Arc::clone(&events));
        let dialog: ResourceDialog<EquipmentForm, FakeClient> =
            ResourceDialog::new(Arc::clone(&client), cache.clone())
                .on_open_change(move |open| open_sink.lock().unwrap().push(format!("open:{open}")))
                .on_success(move |_| success_sink.lock().unwrap().push("success".into()));
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "First draft".into();
            form.category = "Camera".into();
        });

        let (first, ()) = tokio::join!(dialog.submit(), async {
            entered.notified().await;
            dialog.cancel();
            dialog.open(None);
            dialog.update_form(|form| form.name = "Second draft".into());
            release.notify_one();
        });

        assert!(matches!(first, SubmitOutcome::Saved(_)));
        assert_eq!(dialog.state(), DialogState::Editing);
        assert_eq!(dialog.form().name, "Second draft");
        assert_eq!(*events.lock().unwrap(), vec!["open:false"]);
        assert!(cache.get("equipment").is_none());
    }

    #[tokio::test]
    async fn late_failure_keeps_reopened_dialog_quiet() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let client = Arc::new(FakeClient {
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
            ..FakeClient::failing(500, "boom")
        });
        let dialog = dialog(Arc::clone(&client));
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "First draft".into();
            form.category = "Camera".into();
        });

        let (first, ()) = tokio::join!(dialog.submit(), async {
            entered.notified().await;
            dialog.cancel();
            dialog.open(None);
            release.notify_one();
        });

        assert_eq!(first, SubmitOutcome::Failed("boom".into()));
        assert_eq!(dialog.state(), DialogState::Editing);
        assert!(dialog.toast().is_none());
    }

    #[tokio::test]
    async fn locations_refuse_images() {
        let client = Arc::new(FakeClient::default());
        let dialog: ResourceDialog<LocationForm, FakeClient> =
            ResourceDialog::new(client, QueryCache::new());
        dialog.open(None);
        assert!(dialog.attach_image(png("map.png")).is_err());
    }

    #[tokio::test]
    async fn saved_item_reaches_outer_controller() {
        let outer = DialogSubmitController::new();
        let client = Arc::new(FakeClient::default());
        let dialog = dialog(client).with_submit_controller(outer.clone());
        dialog.open(None);
        dialog.update_form(|form| {
            form.name = "Canon EOS R5".into();
            form.category = "Camera".into();
        });

        dialog.submit().await;

        assert_eq!(outer.get_result().unwrap()["name"], json!("Canon EOS R5"));
    }
}
