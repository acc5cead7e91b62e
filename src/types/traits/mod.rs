pub(crate) mod any_instant;
