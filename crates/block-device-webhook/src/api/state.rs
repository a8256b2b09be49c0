use crate::admission_handler::AdmissionHandler;

pub(crate) struct ApiServerState {
    pub(crate) admission_handler: AdmissionHandler,
}
