use crate::endpoints;
use crate::error::{ClientError, ClientResult, Resource};
use crate::sequence::SequenceGuard;
use crate::view::{LibraryView, Presenter};
use kara_core::gateway::decode;
use kara_core::{Gateway, LibraryPage};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct LibraryState {
    page: LibraryPage,
    query: String,
    sequence: SequenceGuard,
}

/// Cursor-paginated, title-filtered view over the song catalog.
///
/// Holds exactly one page. Every navigation replaces it in full; cursors are
/// followed verbatim as handed out by the server.
pub struct LibraryPaginator<G> {
    gateway: Arc<G>,
    presenter: Arc<dyn Presenter>,
    state: Mutex<LibraryState>,
}

impl<G: Gateway> LibraryPaginator<G> {
    pub fn new(gateway: Arc<G>, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            gateway,
            presenter,
            state: Mutex::new(LibraryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, LibraryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn page(&self) -> LibraryPage {
        self.state().page.clone()
    }

    pub fn query(&self) -> String {
        self.state().query.clone()
    }

    pub fn view(&self) -> LibraryView {
        let state = self.state();
        LibraryView::from_page(&state.page, &state.query)
    }

    /// Unfiltered first page, as shown on startup.
    pub async fn load(&self) -> ClientResult<()> {
        self.fetch(endpoints::LIBRARY_SONGS.to_string()).await
    }

    /// Update the held query text without fetching.
    pub fn set_query(&self, query: impl Into<String>) {
        self.state().query = query.into();
    }

    /// Search with the held query.
    pub async fn submit(&self) -> ClientResult<()> {
        let url = endpoints::library_search(&self.state().query);
        self.fetch(url).await
    }

    pub async fn search(&self, query: &str) -> ClientResult<()> {
        self.set_query(query);
        self.fetch(endpoints::library_search(query)).await
    }

    /// Follow the `next` cursor. Returns `false` when there is none.
    pub async fn next(&self) -> ClientResult<bool> {
        let cursor = self.state().page.next.clone();
        self.follow(cursor).await
    }

    /// Follow the `previous` cursor. Returns `false` when there is none.
    pub async fn previous(&self) -> ClientResult<bool> {
        let cursor = self.state().page.previous.clone();
        self.follow(cursor).await
    }

    /// Back to page one of the current query; a no-op on page one.
    pub async fn first(&self) -> ClientResult<bool> {
        let url = {
            let state = self.state();
            state
                .page
                .has_previous()
                .then(|| endpoints::library_search(&state.query))
        };
        self.follow(url).await
    }

    /// Jump to the last page of the current query; a no-op on the last page.
    pub async fn last(&self) -> ClientResult<bool> {
        let url = {
            let state = self.state();
            state
                .page
                .has_next()
                .then(|| endpoints::library_last(&state.query))
        };
        self.follow(url).await
    }

    async fn follow(&self, url: Option<String>) -> ClientResult<bool> {
        match url {
            Some(url) => self.fetch(url).await.map(|()| true),
            None => Ok(false),
        }
    }

    async fn fetch(&self, url: String) -> ClientResult<()> {
        let ticket = self.state().sequence.issue();
        tracing::debug!(%url, "fetching library page");

        let page: LibraryPage = match self.gateway.get(&url).await.and_then(decode) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(%url, error = %err, "library fetch failed");
                return Err(err.into());
            }
        };

        let view = {
            let mut state = self.state();
            if !state.sequence.accept(ticket) {
                tracing::debug!(%url, "discarding superseded library page");
                return Err(ClientError::StaleResponse {
                    resource: Resource::Library,
                });
            }
            state.page = page;
            LibraryView::from_page(&state.page, &state.query)
        };
        self.presenter.library_changed(&view);
        Ok(())
    }
}
