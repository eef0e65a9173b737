use quote::{format_ident, quote};

/// Emits one `#[test]` per `.lox` file under `tests/scripts`, each feeding
/// the script to an `expect_script` function the expanding crate provides.
#[proc_macro]
pub fn generate_tests(_: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let scripts_dir = format!("{}/../scripts", env!("CARGO_MANIFEST_DIR"));

    let tests = walkdir::WalkDir::new(scripts_dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| entry.path().extension() == Some("lox".as_ref()))
        .map(|entry| {
            let script_path = entry.path().to_string_lossy().into_owned();
            let stem = entry.path().file_stem().unwrap_or_default().to_string_lossy().into_owned();
            let test_ident = format_ident!("script_{}", stem.replace('-', "_"));
            quote! {
                #[test]
                fn #test_ident() {
                    expect_script(std::fs::read_to_string(#script_path).unwrap().as_str());
                }
            }
        });

    quote! {
        #[ctor::ctor]
        fn init() {
            env_logger::init();
        }

        #(#tests)*
    }
    .into()
}
