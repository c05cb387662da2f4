use super::response::NavButton;
use crate::db::Database;
use rusqlite::Connection;

/// State that lives for exactly one chat request: the store connection handed
/// to data tools and the buttons collected by UI-hint tools.
///
/// Dropping the context closes the connection.
pub struct RequestContext {
    conn: Connection,
    pending_buttons: Vec<NavButton>,
}

impl RequestContext {
    /// Opens a fresh read-only connection for one request.
    pub fn open(db: &Database) -> rusqlite::Result<Self> {
        let conn = db.connect()?;
        conn.pragma_update(None, "query_only", true)?;
        Ok(Self::new(conn))
    }

    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            pending_buttons: Vec::new(),
        }
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn record_buttons(&mut self, buttons: impl IntoIterator<Item = NavButton>) {
        self.pending_buttons.extend(buttons);
    }

    pub fn pending_buttons(&self) -> &[NavButton] {
        &self.pending_buttons
    }

    pub fn take_buttons(&mut self) -> Vec<NavButton> {
        std::mem::take(&mut self.pending_buttons)
    }
}
