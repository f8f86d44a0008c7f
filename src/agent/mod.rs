pub(crate) mod runloop;
