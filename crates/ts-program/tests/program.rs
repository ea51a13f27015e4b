use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use std::fs;
use ts_program::{create_program, load_config, CompilerOptions, ProgramError, Resolution};

fn workspace() -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
    (dir, root)
}

#[test]
fn loads_imported_files_from_disk() {
    let (_dir, root) = workspace();
    fs::create_dir_all(root.join("src/shared")).unwrap();
    fs::write(
        root.join("src/Button.tsx"),
        "import { Shared } from './shared';\nexport interface Props extends Shared { label: string }\n",
    )
    .unwrap();
    fs::write(
        root.join("src/shared/index.ts"),
        "export interface Shared { id: number }\n",
    )
    .unwrap();

    let program = create_program(&[root.join("src/Button.tsx")], CompilerOptions::default()).unwrap();

    assert_eq!(program.files().count(), 2);
    assert_eq!(program.root_files().count(), 1);
    let button = program.file_id(&root.join("src/Button.tsx")).unwrap();
    let shared = program.file_id(&root.join("src/shared/index.ts")).unwrap();
    assert_eq!(
        program.resolve_name(button, "Shared"),
        Some(Resolution::Local(ts_program::DeclRef {
            file: shared,
            name: "Shared".into()
        }))
    );
}

#[test]
fn follow_imports_can_be_disabled() {
    let (_dir, root) = workspace();
    fs::write(root.join("a.ts"), "import { B } from './b';\n").unwrap();
    fs::write(root.join("b.ts"), "export type B = string;\n").unwrap();

    let options = CompilerOptions {
        follow_imports: false,
        ..CompilerOptions::default()
    };
    let program = create_program(&[root.join("a.ts")], options).unwrap();
    assert_eq!(program.files().count(), 1);
    assert!(!program.contains(&root.join("b.ts")));
}

#[test]
fn missing_root_file_is_an_io_error() {
    let (_dir, root) = workspace();
    let result = create_program(&[root.join("missing.ts")], CompilerOptions::default());
    assert!(matches!(result, Err(ProgramError::Io { .. })));
}

#[test]
fn parse_errors_report_the_file() {
    let (_dir, root) = workspace();
    fs::write(root.join("broken.tsx"), "export const = ;\n").unwrap();
    let err = create_program(&[root.join("broken.tsx")], CompilerOptions::default())
        .err()
        .unwrap();
    assert!(err.to_string().contains("broken.tsx:1:"));
}

#[test]
fn tsconfig_paths_drive_module_resolution() {
    let (_dir, root) = workspace();
    fs::create_dir_all(root.join("src/lib")).unwrap();
    fs::write(
        root.join("tsconfig.json"),
        r#"{
            "compilerOptions": {
                "strict": true,
                "baseUrl": ".",
                "paths": { "~lib/*": ["src/lib/*"] }
            }
        }"#,
    )
    .unwrap();
    fs::write(
        root.join("src/App.tsx"),
        "import type { Size } from '~lib/size';\nexport type P = { size: Size };\n",
    )
    .unwrap();
    fs::write(
        root.join("src/lib/size.ts"),
        "export type Size = 'small' | 'large';\n",
    )
    .unwrap();

    let options = load_config(root.join("tsconfig.json")).unwrap();
    assert!(options.strict_null_checks());
    let program = create_program(&[root.join("src/App.tsx")], options).unwrap();
    let app = program.file_id(&root.join("src/App.tsx")).unwrap();
    let size = program.lookup_type(app, "Size").unwrap();
    assert_eq!(
        program.source(size.file).path(),
        Utf8Path::new(root.join("src/lib/size.ts").as_str())
    );
}
