//! Sender and receiver stay in sync over arbitrary sequences of document
//! states, whatever the byte order of either host.

use proptest::prelude::*;
use semantic_tokens_wire::{
    DocumentSemanticTokensAdapter, DocumentSemanticTokensProvider, Endianness, ProvidedTokens,
    ProviderResult, SemanticTokens, SemanticTokensCodec, SemanticTokensSettings,
    SemanticTokensStore,
};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;
use url::Url;

#[derive(Default)]
struct Replay {
    current: Mutex<Vec<u32>>,
}

impl DocumentSemanticTokensProvider for Replay {
    async fn provide_full(&self, _uri: &Url, _cancel: &CancellationToken) -> ProviderResult {
        let data = self.current.lock().unwrap().clone();
        Ok(Some(ProvidedTokens::Tokens(SemanticTokens {
            result_id: None,
            data,
        })))
    }
}

fn token_array() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(prop::array::uniform5(0u32..8), 0..24)
        .prop_map(|tokens| tokens.into_iter().flatten().collect())
}

fn endianness() -> impl Strategy<Value = Endianness> {
    prop_oneof![Just(Endianness::Little), Just(Endianness::Big)]
}

proptest! {
    #[test]
    fn receiver_converges_on_every_state(
        states in prop::collection::vec(token_array(), 1..8),
        sender_host in endianness(),
        receiver_host in endianness(),
        cap in prop::option::of(1usize..3),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let uri = Url::parse("file:///prop.rs").unwrap();
        let settings = SemanticTokensSettings {
            max_retained_results: cap,
            ..SemanticTokensSettings::default()
        };
        let adapter = DocumentSemanticTokensAdapter::new(
            Replay::default(),
            SemanticTokensCodec::new(sender_host),
            settings,
        );
        let receiver = SemanticTokensCodec::new(receiver_host);
        let mut store = SemanticTokensStore::new();
        let cancel = CancellationToken::new();

        for state in states {
            *adapter.provider().current.lock().unwrap() = state.clone();
            let bytes = runtime
                .block_on(adapter.provide_document_semantic_tokens(
                    &uri,
                    store.previous_handle(),
                    &cancel,
                ))
                .unwrap();

            if let Some(superseded) = store.apply_encoded(&receiver, &bytes).unwrap() {
                adapter.release(&uri, superseded);
            }
            prop_assert_eq!(store.data(), state.as_slice());
            prop_assert_eq!(adapter.cached_results(&uri), vec![store.previous_handle()]);
        }
    }
}
