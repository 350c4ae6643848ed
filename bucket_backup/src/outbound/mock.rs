//! This module provides [mockall::mock] concrete structs [MockStore] and [MockTopicNotifier] which can be used for testing
use crate::domain::{
    models::{BucketLocation, NotificationMessage, ObjectPage, SourceObject},
    ports::{Notifier, ObjectStore},
};
use mockall::mock;

const _NOT_PROD: () = const {
    assert!(
        cfg!(debug_assertions),
        "You are trying to include mock code in a production build please run `cargo tree -i bucket_backup -e features -p <FAILING_PACKAGE>` to see how the mock feature is being included in [dependencies]"
    );
};

mock! {
    pub Store {}
    impl ObjectStore for Store {
        type Err = anyhow::Error;

        fn list_page<'a>(
            &self,
            location: &'a BucketLocation,
            continuation_token: Option<String>,
        ) -> impl Future<Output = Result<ObjectPage, anyhow::Error>> + Send;

        fn copy_object<'a, 'b, 'c>(
            &self,
            source_bucket: &'a str,
            object: &'b SourceObject,
            destination_bucket: &'c str,
        ) -> impl Future<Output = Result<(), anyhow::Error>> + Send;
    }
}

mock! {
    pub TopicNotifier {}
    impl Notifier for TopicNotifier {
        type Err = anyhow::Error;

        fn publish<'a>(
            &self,
            message: &'a NotificationMessage,
        ) -> impl Future<Output = Result<(), anyhow::Error>> + Send;
    }
}
