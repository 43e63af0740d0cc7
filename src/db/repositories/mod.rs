pub(crate) mod nights;
