// All updates travel through a single broadcast channel; pages filter by
// category on the receiving end.

use serde::{Deserialize, Serialize};

use crate::tournament::Category;

/// A message which is sent after an operator modifies tournament data. Public
/// pages hold a WebSocket open and re-fetch their whole view when one of
/// these arrives for their category.
#[derive(Clone, Debug)]
pub struct Msg {
    pub category: Category,
    pub inner: MsgContents,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub enum MsgContents {
    TeamsUpdate,
    GroupMatchesUpdate,
    PlayoffMatchesUpdate,
    BracketUpdate,
}
