//! Error-channel protocol under the `Report` policy.
//!
//! Lives in its own binary: the policy override is process-wide.

use std::ptr;

use ppl_rs_membrane::error_channel::{protocol_policy, set_protocol_policy};
use ppl_rs_membrane::kinds::PolyhedronKind;
use ppl_rs_membrane::metrics::global_metrics;
use ppl_rs_membrane::{NativeHandle, PplError, ProtocolPolicy, library};
use ppl_rs_native::{
    PPL_ERROR_DOMAIN_ERROR, PPL_ERROR_INVALID_ARGUMENT, PPL_TOPOLOGY_CLOSED, config_abi,
    descriptor_abi, polyhedron_abi,
};

#[test]
fn status_and_report_must_agree() {
    set_protocol_policy(ProtocolPolicy::Report);
    assert_eq!(protocol_policy(), ProtocolPolicy::Report);
    let before = global_metrics().snapshot().protocol_violations;

    // A matching report translates to the typed error.
    let err = library::call(|| unsafe { descriptor_abi::ppl_new_Linear_Expression(ptr::null_mut()) })
        .unwrap_err();
    assert!(matches!(err, PplError::InvalidArgument(_)));

    // A failure the handler never heard about.
    let err = library::call(|| unsafe { config_abi::ppl_rs_fail_unreported(-8) }).unwrap_err();
    assert!(matches!(err, PplError::Protocol { code: -8, .. }));

    // The handler heard one code, the caller got another.
    let err = library::call(|| {
        let reported = unsafe { descriptor_abi::ppl_new_Linear_Expression(ptr::null_mut()) };
        assert_eq!(reported, PPL_ERROR_INVALID_ARGUMENT);
        PPL_ERROR_DOMAIN_ERROR
    })
    .unwrap_err();
    match err {
        PplError::Protocol { code, message } => {
            assert_eq!(code, PPL_ERROR_DOMAIN_ERROR);
            assert!(message.contains("-3"), "{message}");
        }
        other => panic!("expected a protocol violation, got {other:?}"),
    }

    assert_eq!(global_metrics().snapshot().protocol_violations, before + 2);

    // Normal operation resumes afterwards.
    let p = NativeHandle::<PolyhedronKind>::acquire(|out| unsafe {
        polyhedron_abi::new_from_space_dimension(out, PPL_TOPOLOGY_CLOSED, 2, 1)
    })
    .unwrap();
    let ptr = p.as_ptr();
    assert!(library::call_predicate(|| unsafe { polyhedron_abi::is_empty(ptr) }).unwrap());
}

#[test]
fn metrics_snapshot_serializes() {
    let snap = global_metrics().snapshot();
    let json = serde_json::to_value(snap).unwrap();
    assert!(json.get("foreign_calls").is_some());
    assert!(json.get("protocol_violations").is_some());
}
