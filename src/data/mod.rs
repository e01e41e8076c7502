pub(crate) mod observation;
