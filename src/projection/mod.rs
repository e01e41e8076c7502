pub(crate) mod mapper;
pub(crate) mod scale;
pub(crate) mod transition;
