//! The HR console: one store per collection over a shared client.

use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join3;
use tracing::{info, warn};

use crate::account::AccountGateway;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::StoreError;
use crate::http::Transport;
use crate::resource::Gateway;
use crate::resources::{Holidays, LeavePolicies, LeaveTypes, WorkShifts};
use crate::store::{Lane, LaneState, ResourceStore};
use crate::types::HolidayFilter;

/// Stores for every managed collection plus the account endpoints.
///
/// Stores are behind `Arc` so views can hold on to the one they render.
#[derive(Debug)]
pub struct HrConsole {
    holidays: Arc<ResourceStore<Holidays>>,
    leave_types: Arc<ResourceStore<LeaveTypes>>,
    leave_policies: Arc<ResourceStore<LeavePolicies>>,
    work_shifts: Arc<ResourceStore<WorkShifts>>,
    account: AccountGateway,
    bootstrap: Mutex<LaneState>,
}

impl HrConsole {
    pub fn new(client: ApiClient) -> Self {
        Self {
            holidays: Arc::new(ResourceStore::new(Gateway::new(client.clone()))),
            leave_types: Arc::new(ResourceStore::new(Gateway::new(client.clone()))),
            leave_policies: Arc::new(ResourceStore::new(Gateway::new(client.clone()))),
            work_shifts: Arc::new(ResourceStore::new(Gateway::new(client.clone()))),
            account: AccountGateway::new(client),
            bootstrap: Mutex::new(LaneState::default()),
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self::new(ApiClient::from_config(config, transport, credentials))
    }

    pub fn holidays(&self) -> &Arc<ResourceStore<Holidays>> {
        &self.holidays
    }

    pub fn leave_types(&self) -> &Arc<ResourceStore<LeaveTypes>> {
        &self.leave_types
    }

    pub fn leave_policies(&self) -> &Arc<ResourceStore<LeavePolicies>> {
        &self.leave_policies
    }

    pub fn work_shifts(&self) -> &Arc<ResourceStore<WorkShifts>> {
        &self.work_shifts
    }

    pub fn account(&self) -> &AccountGateway {
        &self.account
    }

    /// State of the last `load_all`.
    pub fn bootstrap_state(&self) -> LaneState {
        self.bootstrap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetch holidays, leave types and work shifts concurrently.
    ///
    /// All three must succeed. Every request is allowed to finish, but if any
    /// of them failed no cache is touched: the three list lanes fail with the
    /// first error (in the order above), which is also returned.
    pub async fn load_all(&self, filter: &HolidayFilter) -> Result<(), StoreError> {
        self.set_bootstrap(LaneState::loading());
        self.holidays.begin(Lane::List);
        self.leave_types.begin(Lane::List);
        self.work_shifts.begin(Lane::List);

        let (holidays, leave_types, work_shifts) = join3(
            self.holidays.gateway().list(filter),
            self.leave_types.gateway().list(&()),
            self.work_shifts.gateway().list(&()),
        )
        .await;

        let joined = match (holidays, leave_types, work_shifts) {
            (Ok(holidays), Ok(leave_types), Ok(work_shifts)) => Ok((holidays, leave_types, work_shifts)),
            (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => Err(err),
        };
        match joined {
            Ok((holidays, leave_types, work_shifts)) => {
                info!(
                    holidays = holidays.len(),
                    leave_types = leave_types.len(),
                    work_shifts = work_shifts.len(),
                    "console data loaded"
                );
                self.holidays.settle_list(Ok(holidays));
                self.leave_types.settle_list(Ok(leave_types));
                self.work_shifts.settle_list(Ok(work_shifts));
                self.set_bootstrap(LaneState::succeeded());
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "console data load failed, discarding partial results");
                self.holidays.settle_list(Err(err.clone()));
                self.leave_types.settle_list(Err(err.clone()));
                self.work_shifts.settle_list(Err(err.clone()));
                self.set_bootstrap(LaneState::failed(err.normalized()));
                Err(err.into())
            }
        }
    }

    fn set_bootstrap(&self, state: LaneState) {
        *self.bootstrap.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
