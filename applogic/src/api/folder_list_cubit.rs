// SPDX-FileCopyrightText: 2026 Plume Labs <hello@plume.im>
//
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Cubit driving the folder management screen
//!
//! Owns the folder snapshot, reconciles it into the display list, and applies
//! user mutations optimistically before the server confirms them. All
//! mutations go through the shared model behind a single mutex, so the display
//! list is always derived from one consistent snapshot.

use std::{future::Future, sync::Arc, time::Duration};

use parking_lot::Mutex;
use plumecommon::identifiers::{FolderId, FolderRef};
use plumecoreclient::folders::{
    CreationLimit, DragSession, EditOp, FolderDefinition, FolderListUpdate, FolderRequestError,
    FolderSettings, FolderSnapshot, FoldersClient, ReorderCapabilities, ReorderCommit,
    ReorderError, diff, reconcile_snapshot,
};
use tokio::sync::{broadcast, watch};
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, WatchStream, errors::BroadcastStreamRecvError},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::util::{Cubit, CubitCore};

use super::types::{UiCreationLimit, UiListEntry, UiRecommendedFolder};

/// Delay before recommended folders are re-fetched after a mutation. Repeated
/// mutations within the window restart it.
const RECOMMENDED_REFRESH_DELAY: Duration = Duration::from_millis(500);

const PATCH_CHANNEL_SIZE: usize = 64;

/// State of [`FolderListCubit`]: the display list and the creation limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListState {
    pub entries: Vec<UiListEntry>,
    pub limit: Option<UiCreationLimit>,
}

impl FolderListState {
    /// Whether the create-folder action is currently available. Optimistic
    /// while the limit has not been fetched yet.
    pub fn can_create_folder(&self) -> bool {
        self.limit.is_none_or(|limit| limit.current < limit.max)
    }
}

/// A batch of edits bringing a live indexed view up to date with
/// [`FolderListState::entries`].
///
/// An empty patch signals that the subscriber fell behind and must rebind
/// from the current state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayListPatch {
    pub ops: Vec<EditOp<UiListEntry>>,
}

/// Provides the folder management display list to the UI and serializes all
/// folder mutations of this session.
pub struct FolderListCubit<C, S> {
    core: CubitCore<FolderListState>,
    context: FolderListContext<C, S>,
}

impl<C, S> FolderListCubit<C, S>
where
    C: FoldersClient + Clone + Send + Sync + 'static,
    S: FolderSettings + 'static,
{
    pub fn new(client: C, settings: Arc<S>) -> Self {
        let core = CubitCore::new();
        let (patch_tx, _) = broadcast::channel(PATCH_CHANNEL_SIZE);
        let context = FolderListContext {
            client,
            settings,
            state_tx: core.state_tx().clone(),
            patch_tx,
            model: Arc::new(Mutex::new(FolderModel {
                // screens start focused; focus changes arrive via lifecycle
                focused: true,
                ..Default::default()
            })),
            cancel: core.cancellation_token().clone(),
        };
        context.clone().spawn();
        Self { core, context }
    }

    // Cubit interface

    pub fn close(&mut self) {
        self.core.close();
    }

    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    pub fn state(&self) -> FolderListState {
        self.core.state()
    }

    pub fn stream(&self) -> WatchStream<FolderListState> {
        self.core.stream()
    }

    /// Edit scripts corresponding to each state change, for views that keep a
    /// live indexed list instead of rebinding on every state.
    pub fn patches(&self) -> impl Stream<Item = Arc<DisplayListPatch>> + Send + 'static {
        BroadcastStream::new(self.context.patch_tx.subscribe()).map(|patch| match patch {
            Ok(patch) => patch,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                error!(skipped, "display list patch stream lagged");
                Arc::new(DisplayListPatch::default())
            }
        })
    }

    // Lifecycle

    /// Focus state of the screen. Recommended folder refreshes are deferred
    /// while the screen is out of focus and fired on refocus.
    pub fn set_focused(&self, focused: bool) {
        let fire = {
            let mut model = self.context.model.lock();
            model.focused = focused;
            focused && std::mem::take(&mut model.pending_recommended_refresh)
        };
        if fire {
            let context = self.context.clone();
            self.context
                .spawn_guarded(async move { context.refresh_recommended().await });
        }
    }

    // Toggles

    /// Flips the chat-list toggle of a folder row. Purely local state.
    pub fn toggle_folder(&self, folder: FolderRef) -> bool {
        let _guard = self.context.model.lock();
        let enabled = !self.context.settings.is_enabled(folder);
        let mut update = None;
        self.context.state_tx.send_if_modified(|state| {
            let Some(at) = state
                .entries
                .iter()
                .position(|entry| entry.folder_ref() == Some(folder))
            else {
                return false;
            };
            let mut entry = state.entries[at].clone();
            if !entry.set_enabled(enabled) {
                return false;
            }
            state.entries[at] = entry.clone();
            update = Some((at, entry));
            true
        });
        let Some((at, item)) = update else {
            return false;
        };
        self.context.settings.set_enabled(folder, enabled);
        let _ = self.context.patch_tx.send(Arc::new(DisplayListPatch {
            ops: vec![EditOp::Update { at, item }],
        }));
        true
    }

    // Drag reorder

    /// Starts a drag on the display row at `index`.
    pub fn begin_drag(&self, index: usize) -> Result<(), ReorderError> {
        let mut model = self.context.model.lock();
        if model.drag.is_some() {
            return Err(ReorderError::AlreadyDragging);
        }
        let capabilities = model.capabilities();
        let entries = self.context.state_tx.borrow().entries.clone();
        model.drag = Some(DragSession::begin(&entries, index, capabilities)?);
        Ok(())
    }

    /// Proposes moving the dragged row; `false` leaves the list untouched.
    pub fn move_drag(&self, from: usize, to: usize) -> bool {
        let mut model = self.context.model.lock();
        let capabilities = model.capabilities();
        let Some(drag) = model.drag.as_mut() else {
            return false;
        };
        if !drag.move_to(from, to, capabilities) {
            return false;
        }
        let rows = drag.rows().to_vec();
        self.context
            .state_tx
            .send_modify(|state| state.entries = rows);
        let _ = self.context.patch_tx.send(Arc::new(DisplayListPatch {
            ops: vec![EditOp::Move { from, to }],
        }));
        true
    }

    /// Commits the active drag: applies the new order to the snapshot, then
    /// persists it. A server rejection resynchronizes from the server.
    pub async fn commit_drag(&self) -> anyhow::Result<()> {
        let commit = {
            let mut model = self.context.model.lock();
            let capabilities = model.capabilities();
            let Some(session) = model.drag.take() else {
                return Ok(());
            };
            match session.commit(capabilities) {
                Ok(commit) => {
                    self.context
                        .settings
                        .set_archive_position(commit.archive_position);
                    model.apply_reorder(&commit);
                    model.generation += 1;
                    self.context.emit(&model);
                    commit
                }
                Err(error) => {
                    // restore the pre-drag order from the snapshot
                    self.context.emit(&model);
                    return Err(error.into());
                }
            }
        };
        // with no user-defined folders the commit carries nothing the server
        // stores; the archive position is already persisted locally
        if commit.folder_ids.is_empty() {
            return Ok(());
        }
        match self
            .context
            .client
            .reorder_folders(commit.folder_ids, commit.main_position)
            .await
        {
            Ok(()) => {
                self.context.schedule_recommended_refresh();
                Ok(())
            }
            Err(error) => {
                warn!(%error, "server rejected the folder reorder");
                self.context.refresh_folders().await;
                Err(error.into())
            }
        }
    }

    /// Abandons the active drag and restores the snapshot order.
    pub fn cancel_drag(&self) {
        let mut model = self.context.model.lock();
        if model.drag.take().is_some() {
            self.context.emit(&model);
        }
    }

    // Folder CRUD

    pub async fn folder_definition(&self, id: FolderId) -> anyhow::Result<FolderDefinition> {
        Ok(self.context.client.folder_definition(id).await?)
    }

    /// Creates a folder; it appears in the list once the server confirmed it.
    pub async fn create_folder(&self, definition: FolderDefinition) -> anyhow::Result<FolderId> {
        match self.context.client.create_folder(definition).await {
            Ok(id) => {
                self.context.refresh_folders().await;
                self.context.refresh_limit().await;
                self.context.schedule_recommended_refresh();
                Ok(id)
            }
            Err(error) => {
                warn!(%error, "failed to create folder");
                self.context.handle_request_error(&error).await;
                Err(error.into())
            }
        }
    }

    pub async fn edit_folder(
        &self,
        id: FolderId,
        definition: FolderDefinition,
    ) -> anyhow::Result<()> {
        match self.context.client.edit_folder(id, definition.clone()).await {
            Ok(()) => {
                {
                    let mut model = self.context.model.lock();
                    if let Some(folder) =
                        model.snapshot.folders.iter_mut().find(|folder| folder.id == id)
                    {
                        folder.title = definition.title;
                        folder.icon = definition.icon;
                        model.generation += 1;
                        self.context.emit(&model);
                    }
                }
                self.context.schedule_recommended_refresh();
                Ok(())
            }
            Err(error) => {
                warn!(%error, "failed to edit folder");
                self.context.handle_request_error(&error).await;
                Err(error.into())
            }
        }
    }

    /// Deletes a folder, removing it from the list immediately. A rejection
    /// restores the list from the server.
    pub async fn delete_folder(&self, id: FolderId) -> anyhow::Result<()> {
        let expected_archive = {
            let mut model = self.context.model.lock();
            let Some(position) = model
                .snapshot
                .folders
                .iter()
                .position(|folder| folder.id == id)
            else {
                return Ok(());
            };
            model.snapshot.folders.remove(position);
            model.generation += 1;

            // display slot of the removed folder decides whether the stored
            // archive position shifts down by one
            let mut slot = position as u32;
            if slot >= model.snapshot.main_position {
                slot += 1;
            }
            let archive_position = model.snapshot.archive_position;
            if slot >= archive_position {
                slot += 1;
            }
            let affects_archive = slot < archive_position
                && (archive_position as usize) < model.snapshot.folders.len() + 3;
            self.context.emit(&model);
            affects_archive.then_some(archive_position)
        };
        match self.context.client.delete_folder(id).await {
            Ok(()) => {
                if let Some(expected) = expected_archive {
                    let mut model = self.context.model.lock();
                    // only adjust if nothing else moved it meanwhile
                    if self.context.settings.archive_position() == expected {
                        self.context.settings.set_archive_position(expected - 1);
                        model.snapshot.archive_position = expected - 1;
                        model.generation += 1;
                        self.context.emit(&model);
                    }
                }
                self.context.refresh_limit().await;
                self.context.schedule_recommended_refresh();
                Ok(())
            }
            Err(error) => {
                warn!(%error, "failed to delete folder");
                self.context.refresh_folders().await;
                Err(error.into())
            }
        }
    }

    /// Creates a folder from a recommendation and drops the suggestion row.
    pub async fn promote_recommended(
        &self,
        definition: FolderDefinition,
    ) -> anyhow::Result<FolderId> {
        let title = definition.title.clone();
        let id = self.create_folder(definition).await?;
        let mut model = self.context.model.lock();
        model.recommended.retain(|recommended| recommended.title != title);
        self.context.emit(&model);
        Ok(id)
    }
}

/// Shared context of the cubit and its background tasks.
struct FolderListContext<C, S> {
    client: C,
    settings: Arc<S>,
    state_tx: watch::Sender<FolderListState>,
    patch_tx: broadcast::Sender<Arc<DisplayListPatch>>,
    model: Arc<Mutex<FolderModel>>,
    cancel: CancellationToken,
}

impl<C: Clone, S> Clone for FolderListContext<C, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            settings: self.settings.clone(),
            state_tx: self.state_tx.clone(),
            patch_tx: self.patch_tx.clone(),
            model: self.model.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<C, S> FolderListContext<C, S>
where
    C: FoldersClient + Clone + Send + Sync + 'static,
    S: FolderSettings + 'static,
{
    fn spawn(self) {
        let stop = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => return,
                _ = self.load_initial() => {}
            }
            self.push_updates_loop(stop).await;
        });
    }

    async fn load_initial(&self) {
        self.refresh_folders().await;
        self.refresh_limit().await;
        self.refresh_recommended().await;
    }

    async fn push_updates_loop(&self, stop: CancellationToken) {
        let mut updates = self.client.subscribe();
        loop {
            tokio::select! {
                _ = stop.cancelled() => return,
                update = updates.next() => {
                    let Some(update) = update else { return };
                    self.apply_folder_list(update).await;
                }
            }
        }
    }

    /// Applies a folder list pushed from another session.
    async fn apply_folder_list(&self, update: FolderListUpdate) {
        {
            let mut model = self.model.lock();
            // supersede any list fetch still in flight; its response is
            // older than this push
            model.refresh_seq += 1;
            model.snapshot = FolderSnapshot::new(update, self.settings.archive_position());
            model.generation += 1;
            self.emit(&model);
        }
        self.refresh_limit().await;
        self.schedule_recommended_refresh();
    }

    /// Re-fetches the folder list. Out-of-order responses are discarded so a
    /// slow refresh cannot overwrite a newer one.
    async fn refresh_folders(&self) {
        let seq = {
            let mut model = self.model.lock();
            model.refresh_seq += 1;
            model.refresh_seq
        };
        match self.client.list_folders().await {
            Ok(list) => {
                let mut model = self.model.lock();
                if model.refresh_seq != seq {
                    debug!("discarding superseded folder list response");
                    return;
                }
                model.snapshot = FolderSnapshot::new(list, self.settings.archive_position());
                model.generation += 1;
                self.emit(&model);
            }
            Err(error) => warn!(%error, "failed to load the folder list"),
        }
    }

    /// Re-fetches the recommended folders, unless the screen is out of focus.
    /// A response is discarded when the folder list changed while it was in
    /// flight; the mutation already scheduled another refresh.
    async fn refresh_recommended(&self) {
        let generation = {
            let mut model = self.model.lock();
            if !model.focused {
                model.pending_recommended_refresh = true;
                return;
            }
            model.generation
        };
        match self.client.recommended_folders().await {
            Ok(recommended) => {
                let mut model = self.model.lock();
                if model.generation != generation {
                    debug!("discarding stale recommended folders response");
                    return;
                }
                model.recommended = recommended
                    .into_iter()
                    .map(UiRecommendedFolder::from)
                    .collect();
                self.emit(&model);
            }
            Err(error) => warn!(%error, "failed to load recommended folders"),
        }
    }

    async fn refresh_limit(&self) {
        match self.client.creation_limit().await {
            Ok(limit) => {
                let mut model = self.model.lock();
                model.limit = Some(limit);
                self.emit(&model);
            }
            Err(error) => warn!(%error, "failed to load the folder creation limit"),
        }
    }

    /// Schedules a recommended folders refresh after the debounce window,
    /// restarting the window if one is already pending.
    fn schedule_recommended_refresh(&self) {
        let timer = CancellationToken::new();
        // the window starts now, not when the task is first polled
        let deadline = tokio::time::Instant::now() + RECOMMENDED_REFRESH_DELAY;
        let previous = {
            let mut model = self.model.lock();
            std::mem::replace(&mut model.recommended_timer, Some(timer.clone()))
        };
        if let Some(previous) = previous {
            previous.cancel();
        }
        let context = self.clone();
        self.spawn_guarded(async move {
            tokio::select! {
                _ = timer.cancelled() => return,
                _ = tokio::time::sleep_until(deadline) => {}
            }
            context.refresh_recommended().await;
        });
    }

    async fn handle_request_error(&self, error: &FolderRequestError) {
        match error {
            // the local snapshot no longer matches the server
            FolderRequestError::Rejected { .. } | FolderRequestError::NotFound => {
                self.refresh_folders().await;
            }
            FolderRequestError::Network(_) => {}
        }
    }

    fn spawn_guarded(&self, task: impl Future<Output = ()> + Send + 'static) {
        let stop = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = task => {}
            }
        });
    }

    /// Derives the display list from the model and publishes state and patch.
    /// Callers must hold the model lock, which serializes emissions.
    fn emit(&self, model: &FolderModel) {
        let entries = match self.build_display_list(model) {
            Ok(entries) => entries,
            Err(error) => {
                // keep the last consistent list on screen and resynchronize
                error!(%error, "folder list reconciliation failed");
                let context = self.clone();
                self.spawn_guarded(async move { context.refresh_folders().await });
                return;
            }
        };
        let limit = model.limit.map(UiCreationLimit::from);
        let ops = {
            let state = self.state_tx.borrow();
            diff(&state.entries, &entries)
        };
        let changed = self.state_tx.send_if_modified(|state| {
            let changed = state.entries != entries || state.limit != limit;
            if changed {
                state.entries = entries;
                state.limit = limit;
            }
            changed
        });
        if changed && !ops.is_empty() {
            let _ = self.patch_tx.send(Arc::new(DisplayListPatch { ops }));
        }
    }

    fn build_display_list(
        &self,
        model: &FolderModel,
    ) -> Result<Vec<UiListEntry>, plumecoreclient::folders::ReconcileError> {
        // an active drag owns the row order until it ends
        if let Some(drag) = &model.drag {
            return Ok(drag.rows().to_vec());
        }
        let group = reconcile_snapshot(&model.snapshot)?;
        let mut entries = Vec::with_capacity(group.len() + 1 + model.recommended.len());
        for entry in group {
            let folder_ref = entry.folder_ref();
            entries.push(UiListEntry::from_folder_entry(
                entry,
                self.settings.is_enabled(folder_ref),
            ));
        }
        entries.push(UiListEntry::CreateFolderRow {
            can_create: model.can_create(),
        });
        entries.extend(
            model
                .recommended
                .iter()
                .cloned()
                .map(UiListEntry::RecommendedFolder),
        );
        Ok(entries)
    }
}

/// Mutable model behind the display list.
#[derive(Debug, Default)]
struct FolderModel {
    snapshot: FolderSnapshot,
    recommended: Vec<UiRecommendedFolder>,
    drag: Option<DragSession<UiListEntry>>,
    limit: Option<CreationLimit>,
    /// Bumped on every folder list change; in-flight recommended responses
    /// issued under an older generation are discarded.
    generation: u64,
    /// Orders folder list refreshes issued by this session.
    refresh_seq: u64,
    focused: bool,
    pending_recommended_refresh: bool,
    recommended_timer: Option<CancellationToken>,
}

impl FolderModel {
    fn capabilities(&self) -> ReorderCapabilities {
        ReorderCapabilities {
            can_move_main: self.limit.is_some_and(|limit| limit.is_entitled()),
            // the relaxed drag rule for the archive row is a debug facility
            allow_archive_anywhere: cfg!(debug_assertions),
        }
    }

    fn can_create(&self) -> bool {
        self.limit.is_none_or(|limit| limit.can_create())
    }

    /// Applies a committed reorder to the snapshot.
    fn apply_reorder(&mut self, commit: &ReorderCommit) {
        let mut folders = std::mem::take(&mut self.snapshot.folders);
        let mut reordered = Vec::with_capacity(folders.len());
        for id in &commit.folder_ids {
            if let Some(index) = folders.iter().position(|folder| folder.id == *id) {
                reordered.push(folders.remove(index));
            }
        }
        // folders the commit does not cover keep their order at the end
        reordered.extend(folders);
        self.snapshot.folders = reordered;
        self.snapshot.main_position = commit.main_position;
        self.snapshot.archive_position = commit.archive_position;
    }
}

#[cfg(test)]
mod tests {
    use plumecoreclient::folders::{
        FolderInfo, FolderList, FoldersResult, MemoryFolderSettings, RecommendedFolder,
    };
    use tokio::sync::Notify;

    use super::*;

    #[derive(Debug)]
    struct MockState {
        folders: Vec<FolderInfo>,
        main_position: u32,
        recommended: Vec<RecommendedFolder>,
        limit: CreationLimit,
        fail_delete: bool,
        fail_reorder: bool,
        /// When set, responses are captured but held back until the matching
        /// release is notified, simulating a slow request.
        hold_list: bool,
        hold_recommended: bool,
        next_id: i32,
        reorder_calls: Vec<(Vec<FolderId>, u32)>,
        recommended_fetches: u32,
    }

    #[derive(Clone)]
    struct MockClient {
        state: Arc<Mutex<MockState>>,
        update_tx: broadcast::Sender<FolderListUpdate>,
        list_release: Arc<Notify>,
        recommended_release: Arc<Notify>,
    }

    impl FoldersClient for MockClient {
        async fn list_folders(&self) -> FoldersResult<FolderList> {
            let (list, hold) = {
                let state = self.state.lock();
                let list = FolderList {
                    folders: state.folders.clone(),
                    main_position: state.main_position,
                };
                (list, state.hold_list)
            };
            if hold {
                self.list_release.notified().await;
            }
            Ok(list)
        }

        async fn folder_definition(&self, id: FolderId) -> FoldersResult<FolderDefinition> {
            let state = self.state.lock();
            state
                .folders
                .iter()
                .find(|folder| folder.id == id)
                .map(|folder| FolderDefinition {
                    title: folder.title.clone(),
                    icon: folder.icon.clone(),
                    ..Default::default()
                })
                .ok_or(FolderRequestError::NotFound)
        }

        async fn create_folder(&self, definition: FolderDefinition) -> FoldersResult<FolderId> {
            let mut state = self.state.lock();
            if state.limit.current >= state.limit.max {
                return Err(FolderRequestError::Rejected {
                    reason: "limit reached".into(),
                });
            }
            let id = FolderId(state.next_id);
            state.next_id += 1;
            state.folders.push(FolderInfo {
                id,
                title: definition.title,
                icon: definition.icon,
            });
            state.limit.current += 1;
            Ok(id)
        }

        async fn edit_folder(
            &self,
            id: FolderId,
            definition: FolderDefinition,
        ) -> FoldersResult<()> {
            let mut state = self.state.lock();
            let folder = state
                .folders
                .iter_mut()
                .find(|folder| folder.id == id)
                .ok_or(FolderRequestError::NotFound)?;
            folder.title = definition.title;
            folder.icon = definition.icon;
            Ok(())
        }

        async fn delete_folder(&self, id: FolderId) -> FoldersResult<()> {
            let mut state = self.state.lock();
            if state.fail_delete {
                return Err(FolderRequestError::Rejected {
                    reason: "refused".into(),
                });
            }
            let position = state
                .folders
                .iter()
                .position(|folder| folder.id == id)
                .ok_or(FolderRequestError::NotFound)?;
            state.folders.remove(position);
            state.limit.current -= 1;
            Ok(())
        }

        async fn reorder_folders(
            &self,
            folder_ids: Vec<FolderId>,
            main_position: u32,
        ) -> FoldersResult<()> {
            let mut state = self.state.lock();
            if state.fail_reorder {
                return Err(FolderRequestError::Rejected {
                    reason: "refused".into(),
                });
            }
            let mut folders = std::mem::take(&mut state.folders);
            let mut reordered = Vec::with_capacity(folders.len());
            for id in &folder_ids {
                if let Some(index) = folders.iter().position(|folder| folder.id == *id) {
                    reordered.push(folders.remove(index));
                }
            }
            reordered.extend(folders);
            state.folders = reordered;
            state.main_position = main_position;
            state.reorder_calls.push((folder_ids, main_position));
            Ok(())
        }

        async fn recommended_folders(&self) -> FoldersResult<Vec<RecommendedFolder>> {
            let (response, hold) = {
                let mut state = self.state.lock();
                state.recommended_fetches += 1;
                let existing: Vec<String> = state
                    .folders
                    .iter()
                    .map(|folder| folder.title.clone())
                    .collect();
                let response: Vec<_> = state
                    .recommended
                    .iter()
                    .filter(|recommended| !existing.contains(&recommended.definition.title))
                    .cloned()
                    .collect();
                (response, state.hold_recommended)
            };
            if hold {
                self.recommended_release.notified().await;
            }
            Ok(response)
        }

        async fn creation_limit(&self) -> FoldersResult<CreationLimit> {
            Ok(self.state.lock().limit)
        }

        fn subscribe(&self) -> impl Stream<Item = FolderListUpdate> + Send + Unpin {
            BroadcastStream::new(self.update_tx.subscribe()).filter_map(|update| update.ok())
        }
    }

    fn folder(id: i32, title: &str) -> FolderInfo {
        FolderInfo {
            id: FolderId(id),
            title: title.into(),
            icon: None,
        }
    }

    fn limit(current: u32, max: u32, entitled_max: u32) -> CreationLimit {
        CreationLimit {
            current,
            max,
            entitled_max,
        }
    }

    fn recommended(title: &str) -> RecommendedFolder {
        RecommendedFolder {
            definition: FolderDefinition {
                title: title.into(),
                include_groups: true,
                ..Default::default()
            },
            description: "Group chats".into(),
        }
    }

    fn mock(folders: Vec<FolderInfo>, main_position: u32, limit: CreationLimit) -> MockClient {
        let (update_tx, _) = broadcast::channel(8);
        MockClient {
            state: Arc::new(Mutex::new(MockState {
                folders,
                main_position,
                recommended: Vec::new(),
                limit,
                fail_delete: false,
                fail_reorder: false,
                hold_list: false,
                hold_recommended: false,
                next_id: 100,
                reorder_calls: Vec::new(),
                recommended_fetches: 0,
            })),
            update_tx,
            list_release: Arc::new(Notify::new()),
            recommended_release: Arc::new(Notify::new()),
        }
    }

    fn cubit(
        client: &MockClient,
        settings: &Arc<MemoryFolderSettings>,
    ) -> FolderListCubit<MockClient, MemoryFolderSettings> {
        FolderListCubit::new(client.clone(), settings.clone())
    }

    /// Lets the background tasks run without advancing the paused clock.
    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    fn titles(state: &FolderListState) -> Vec<String> {
        state
            .entries
            .iter()
            .map(|entry| match entry {
                UiListEntry::MainFolder { .. } => "Main".into(),
                UiListEntry::ArchiveFolder { .. } => "Archive".into(),
                UiListEntry::UserFolder { title, .. } => title.clone(),
                UiListEntry::CreateFolderRow { .. } => "+".into(),
                UiListEntry::RecommendedFolder(suggestion) => format!("rec:{}", suggestion.title),
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn initial_load_builds_the_display_list() {
        let client = mock(
            vec![folder(1, "Work"), folder(2, "News")],
            0,
            limit(2, 10, 10),
        );
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        let state = cubit.state();
        assert_eq!(titles(&state), ["Main", "Archive", "Work", "News", "+"]);
        assert_eq!(
            state.limit,
            Some(UiCreationLimit {
                current: 2,
                max: 10,
                entitled_max: 10,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn promoting_a_recommendation_creates_the_folder() {
        let client = mock(vec![folder(1, "Work")], 0, limit(1, 10, 10));
        client.state.lock().recommended.push(recommended("Groups"));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "Work", "+", "rec:Groups"]
        );

        let definition = cubit
            .state()
            .entries
            .iter()
            .find_map(|entry| match entry {
                UiListEntry::RecommendedFolder(suggestion) => Some(suggestion.definition.clone()),
                _ => None,
            })
            .unwrap();
        let id = cubit.promote_recommended(definition).await.unwrap();
        settle().await;

        assert_eq!(id, FolderId(100));
        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "Work", "Groups", "+"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deleting_before_archive_shifts_the_stored_position() {
        let client = mock(
            vec![folder(1, "Work"), folder(2, "News")],
            0,
            limit(2, 10, 10),
        );
        let settings = Arc::new(MemoryFolderSettings::new());
        settings.set_archive_position(3);
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Work", "News", "Archive", "+"]
        );

        cubit.delete_folder(FolderId(2)).await.unwrap();
        settle().await;

        assert_eq!(settings.archive_position(), 2);
        assert_eq!(titles(&cubit.state()), ["Main", "Work", "Archive", "+"]);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_delete_restores_the_list() {
        let client = mock(
            vec![folder(1, "Work"), folder(2, "News")],
            0,
            limit(2, 10, 10),
        );
        client.state.lock().fail_delete = true;
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        let before = cubit.state();
        assert!(cubit.delete_folder(FolderId(2)).await.is_err());
        settle().await;

        assert_eq!(cubit.state(), before);
        assert_eq!(settings.archive_position(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drag_commit_persists_the_new_order() {
        let client = mock(
            vec![folder(1, "Work"), folder(2, "News")],
            0,
            limit(2, 10, 10),
        );
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        // [Main, Archive, Work, News, +]
        cubit.begin_drag(2).unwrap();
        assert_eq!(
            cubit.begin_drag(3).unwrap_err(),
            ReorderError::AlreadyDragging
        );
        assert!(cubit.move_drag(2, 3));
        cubit.commit_drag().await.unwrap();
        settle().await;

        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "News", "Work", "+"]
        );
        let calls = client.state.lock().reorder_calls.clone();
        assert_eq!(calls, [(vec![FolderId(2), FolderId(1)], 0)]);
        assert_eq!(settings.archive_position(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_reorder_resynchronizes() {
        let client = mock(
            vec![folder(1, "Work"), folder(2, "News")],
            0,
            limit(2, 10, 10),
        );
        client.state.lock().fail_reorder = true;
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        cubit.begin_drag(2).unwrap();
        assert!(cubit.move_drag(2, 3));
        assert!(cubit.commit_drag().await.is_err());
        settle().await;

        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "Work", "News", "+"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn main_row_drag_requires_entitlement() {
        let client = mock(vec![folder(1, "Work")], 0, limit(1, 10, 20));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        let before = cubit.state();
        assert_eq!(
            cubit.begin_drag(0).unwrap_err(),
            ReorderError::MainNotMovable
        );
        cubit.cancel_drag();
        assert_eq!(cubit.state(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_emits_a_targeted_update() {
        let client = mock(vec![folder(1, "Work")], 0, limit(1, 10, 10));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        let mut patches = cubit.patches();
        assert!(cubit.toggle_folder(FolderRef::User(FolderId(1))));

        let patch = patches.next().await.unwrap();
        assert_eq!(
            patch.ops,
            vec![EditOp::Update {
                at: 2,
                item: UiListEntry::UserFolder {
                    id: FolderId(1),
                    title: "Work".into(),
                    enabled: false,
                },
            }]
        );
        assert!(!settings.is_enabled(FolderRef::User(FolderId(1))));
    }

    #[tokio::test(start_paused = true)]
    async fn recommended_refresh_is_debounced() {
        let client = mock(vec![], 0, limit(0, 10, 10));
        client.state.lock().recommended.push(recommended("Groups"));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        cubit
            .create_folder(FolderDefinition {
                title: "Work".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        tokio::time::advance(Duration::from_millis(499)).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        tokio::time::advance(Duration::from_millis(2)).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_mutations_coalesce_the_refresh() {
        let client = mock(vec![], 0, limit(0, 10, 10));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        cubit
            .create_folder(FolderDefinition {
                title: "Work".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        cubit
            .create_folder(FolderDefinition {
                title: "News".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        // the first window would have expired here, but the second mutation
        // restarted it
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        tokio::time::advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn recommended_refresh_waits_for_focus() {
        let client = mock(vec![], 0, limit(0, 10, 10));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        cubit.set_focused(false);
        cubit
            .create_folder(FolderDefinition {
                title: "Work".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 1);

        cubit.set_focused(true);
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn push_update_supersedes_an_in_flight_list_refresh() {
        let client = mock(vec![folder(1, "Old")], 0, limit(1, 10, 10));
        client.state.lock().fail_delete = true;
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = Arc::new(cubit(&client, &settings));
        settle().await;
        assert_eq!(titles(&cubit.state()), ["Main", "Archive", "Old", "+"]);

        // the rejected delete triggers a refresh whose response is held back
        client.state.lock().hold_list = true;
        let handle = cubit.clone();
        tokio::spawn(async move {
            let _ = handle.delete_folder(FolderId(1)).await;
        });
        settle().await;

        // another session replaces the folder list while that refresh is
        // still in flight
        client.state.lock().folders = vec![folder(3, "New")];
        client
            .update_tx
            .send(FolderList {
                folders: vec![folder(3, "New")],
                main_position: 0,
            })
            .unwrap();
        settle().await;
        assert_eq!(titles(&cubit.state()), ["Main", "Archive", "New", "+"]);

        // the held response still carries the pre-push list; it must not
        // overwrite the newer pushed snapshot
        client.list_release.notify_one();
        settle().await;
        assert_eq!(titles(&cubit.state()), ["Main", "Archive", "New", "+"]);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_recommended_response_is_dropped() {
        let client = mock(vec![folder(1, "Work")], 0, limit(1, 10, 10));
        client.state.lock().recommended.push(recommended("Groups"));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;
        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "Work", "+", "rec:Groups"]
        );

        // a scheduled refresh fires but its response is held back
        {
            let mut state = client.state.lock();
            state.hold_recommended = true;
            state.recommended = vec![recommended("Sports")];
        }
        client
            .update_tx
            .send(FolderList {
                folders: vec![folder(1, "Work")],
                main_position: 0,
            })
            .unwrap();
        settle().await;
        tokio::time::advance(RECOMMENDED_REFRESH_DELAY).await;
        settle().await;
        assert_eq!(client.state.lock().recommended_fetches, 2);

        // the folder list changes again while the response is in flight
        client
            .update_tx
            .send(FolderList {
                folders: vec![folder(1, "Work"), folder(2, "News")],
                main_position: 0,
            })
            .unwrap();
        settle().await;

        // releasing the outdated response must leave the suggestions alone
        client.recommended_release.notify_one();
        settle().await;
        assert_eq!(
            titles(&cubit.state()),
            ["Main", "Archive", "Work", "News", "+", "rec:Groups"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn push_updates_replace_the_snapshot() {
        let client = mock(vec![folder(1, "Work")], 0, limit(1, 10, 10));
        let settings = Arc::new(MemoryFolderSettings::new());
        let cubit = cubit(&client, &settings);
        settle().await;

        client
            .update_tx
            .send(FolderList {
                folders: vec![folder(1, "Work"), folder(3, "Fun")],
                main_position: 1,
            })
            .unwrap();
        settle().await;

        // main and archive positions coincide at 1; main is bumped forward
        assert_eq!(
            titles(&cubit.state()),
            ["Work", "Archive", "Main", "Fun", "+"]
        );
    }
}
