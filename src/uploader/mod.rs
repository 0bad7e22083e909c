// Uploader module - the two-phase upload path
//
// Phase one stages raw bytes and yields an upload token; phase two commits
// the token into a durable media item. Both phases run under the retry
// engine.

pub mod media_items;
pub mod upload_token;
