//! Provider data handed to every data source after ConfigureProvider

use crate::api::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct ZpaProviderData {
    pub client: Arc<Client>,
}

impl ZpaProviderData {
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Client scoped to the data source's microtenant_id, if one was given
    pub fn scoped_client(&self, microtenant_id: Option<&str>) -> Client {
        match microtenant_id {
            Some(id) => self.client.with_microtenant(id),
            None => self.client.as_ref().clone(),
        }
    }
}
