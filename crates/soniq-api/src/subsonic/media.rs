// Media endpoints: stream URLs, stars and scrobbles.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::Error;
use crate::subsonic::client::SubsonicClient;
use crate::subsonic::models::{Entity, NoPayload, Response};

impl SubsonicClient {
    /// Authenticated stream URL for a track, or an empty string for a
    /// directory. Makes no request.
    ///
    /// The URL embeds a freshly salted token, so two calls for the same
    /// entity yield different strings.
    pub fn stream_url(&self, entity: &Entity) -> String {
        if entity.is_directory {
            return String::new();
        }
        match self.endpoint_url("stream", &[("id", &entity.id)]) {
            Ok(url) => url.into(),
            Err(e) => {
                warn!(id = %entity.id, error = %e, "could not build stream URL");
                String::new()
            }
        }
    }

    /// Star `id` if it is not in `starred`, unstar it if it is.
    ///
    /// The local set is flipped whether or not the request succeeds, so the
    /// UI reflects the user's intent immediately. The request outcome is
    /// still returned for the caller to report.
    ///
    /// `GET /rest/star?id=...` or `GET /rest/unstar?id=...`
    pub async fn toggle_star(
        &self,
        id: &str,
        starred: &mut HashSet<String>,
    ) -> Result<Response<()>, Error> {
        let was_starred = starred.contains(id);
        let endpoint = if was_starred { "unstar" } else { "star" };

        let result = self.get::<NoPayload>(endpoint, &[("id", id)]).await;

        if was_starred {
            starred.remove(id);
        } else {
            starred.insert(id.to_owned());
        }

        match result {
            Ok(resp) => Ok(resp.map(|_| ())),
            Err(e) => {
                warn!(id, endpoint, error = %e, "star toggle request failed");
                Err(e)
            }
        }
    }

    /// Report playback of a song.
    ///
    /// `submission = false` marks it as "now playing"; `true` records a play.
    ///
    /// `GET /rest/scrobble?id=...&submission=...`
    pub async fn scrobble(&self, id: &str, submission: bool) -> Result<Response<()>, Error> {
        debug!(id, submission, "scrobble");
        let submission = if submission { "true" } else { "false" };
        let resp = self
            .get::<NoPayload>("scrobble", &[("id", id), ("submission", submission)])
            .await?;
        Ok(resp.map(|_| ()))
    }
}
