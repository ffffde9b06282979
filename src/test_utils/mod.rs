#![allow(missing_docs)]

pub(crate) mod http;

pub(crate) use http::{
    TEST_PASSWORD, assert_error, get_test_server, get_test_state, register_and_log_in,
};
